use super::immersive::ImmersivePresenter;
use super::map::MapPresenter;
use super::{Presenter, PresenterContext, PresenterMode};
use crate::error::Result;
use tracing::debug;

/// Builds presenters for modes the host can run
pub struct PresenterFactory;

impl PresenterFactory {
    /// Construct an uninitialized presenter, failing with
    /// `ResourceError::Unavailable` when the host lacks the back-end
    pub async fn create(mode: PresenterMode, context: PresenterContext) -> Result<Box<dyn Presenter>> {
        context.runtime.capabilities().probe(mode).await?;
        debug!(%mode, "Creating presenter");
        let presenter: Box<dyn Presenter> = match mode {
            PresenterMode::Immersive => Box::new(ImmersivePresenter::new(context)),
            PresenterMode::Map => Box::new(MapPresenter::new(context)),
        };
        Ok(presenter)
    }
}
