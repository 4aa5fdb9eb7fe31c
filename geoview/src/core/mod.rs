pub mod camera;
pub mod coordinates;
pub mod geodesy;
pub mod identity;
pub mod projection;
pub mod scene;
