//! Camera flights, advanced once per frame
//!
//! A new request replaces the flight in progress; flights are never queued.

use crate::core::camera::{Camera, ProjectionMode};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlyToOptions {
    /// Seconds; zero jumps
    pub duration: f64,
    /// Camera height above the target in metres
    pub altitude: Option<f64>,
}

impl Default for FlyToOptions {
    fn default() -> Self {
        Self {
            duration: 2.0,
            altitude: None,
        }
    }
}

impl FlyToOptions {
    pub fn instant() -> Self {
        Self {
            duration: 0.0,
            altitude: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub duration: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { duration: 1.0 }
    }
}

/// Where a flight ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraGoal {
    pub position: DVec3,
    pub rotation: DQuat,
    /// Orthographic view height, for parallel cameras
    pub view_height: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    start_position: DVec3,
    start_rotation: DQuat,
    start_height: Option<f64>,
    goal: CameraGoal,
    duration: f64,
    elapsed: f64,
}

fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn orthographic_height(camera: &Camera) -> Option<f64> {
    match camera.projection_mode {
        ProjectionMode::Orthographic { height } => Some(height),
        ProjectionMode::Perspective => None,
    }
}

fn apply(camera: &mut Camera, position: DVec3, rotation: DQuat, height: Option<f64>) {
    camera.transform.translation = position;
    camera.transform.rotation = rotation.normalize();
    if let (Some(height), ProjectionMode::Orthographic { .. }) = (height, camera.projection_mode) {
        camera.projection_mode = ProjectionMode::Orthographic { height };
    }
}

/// Owns the flight in progress, if any
#[derive(Debug, Default)]
pub struct Navigator {
    flight: Option<Flight>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a flight from the camera's current pose, replacing any other
    pub fn fly(&mut self, camera: &mut Camera, goal: CameraGoal, duration: f64) {
        if self.flight.take().is_some() {
            debug!("Camera flight replaced by a newer request");
        }
        if duration <= 0.0 || !duration.is_finite() {
            apply(camera, goal.position, goal.rotation, goal.view_height);
            return;
        }
        self.flight = Some(Flight {
            start_position: camera.transform.translation,
            start_rotation: camera.transform.rotation,
            start_height: orthographic_height(camera),
            goal,
            duration,
            elapsed: 0.0,
        });
    }

    /// Move the camera one step; returns true while a flight is running
    pub fn advance(&mut self, camera: &mut Camera, dt: f64) -> bool {
        let Some(flight) = self.flight.as_mut() else {
            return false;
        };
        flight.elapsed += dt.max(0.0);
        let t = smoothstep(flight.elapsed / flight.duration);

        let position = flight.start_position.lerp(flight.goal.position, t);
        let rotation = flight.start_rotation.slerp(flight.goal.rotation, t);
        let height = match (flight.start_height, flight.goal.view_height) {
            (Some(from), Some(to)) => Some(from + (to - from) * t),
            (_, to) => to,
        };
        apply(camera, position, rotation, height);

        if flight.elapsed >= flight.duration {
            self.flight = None;
            debug!("Camera flight finished");
            false
        } else {
            true
        }
    }

    pub fn cancel(&mut self) {
        self.flight = None;
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    /// Shift a flight in progress along with a rebased scene
    pub fn translate(&mut self, offset: DVec3) {
        if let Some(flight) = self.flight.as_mut() {
            flight.start_position += offset;
            flight.goal.position += offset;
        }
    }
}
