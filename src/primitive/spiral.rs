use anyhow::Context;
use nalgebra::{DVector, Point3, Vector3};

use crate::curve::NurbsCurve;
use crate::misc::{real, FloatingPoint, Plane};

/// Spiral or helix winding around a straight axis or a rail curve
///
/// Unset radii fall back to the distance between the radius point and the axis.
/// # Example
/// ```
/// use nurbs_kernel::prelude::*;
/// use nalgebra::{Point3, Vector3};
///
/// let helix = Spiral::new(Point3::new(1., 0., 0.))
///     .with_pitch(0.5)
///     .with_turn_count(3.);
/// let curve = helix.try_around_axis(&Point3::origin(), &Vector3::z()).unwrap();
/// assert_eq!(curve.degree(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Spiral<T: FloatingPoint> {
    radius_point: Point3<T>,
    pitch: T,
    turn_count: Option<T>,
    start_radius: Option<T>,
    end_radius: Option<T>,
    points_per_turn: usize,
}

impl<T: FloatingPoint> Spiral<T> {
    /// A flat spiral starting at the direction of `radius_point`
    pub fn new(radius_point: Point3<T>) -> Self {
        Self {
            radius_point,
            pitch: T::zero(),
            turn_count: None,
            start_radius: None,
            end_radius: None,
            points_per_turn: 12,
        }
    }

    /// Distance traveled along the axis per turn
    pub fn with_pitch(mut self, pitch: T) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_turn_count(mut self, turn_count: T) -> Self {
        self.turn_count = Some(turn_count);
        self
    }

    pub fn with_radii(mut self, start: T, end: T) -> Self {
        self.start_radius = Some(start);
        self.end_radius = Some(end);
        self
    }

    pub fn with_points_per_turn(mut self, points_per_turn: usize) -> Self {
        self.points_per_turn = points_per_turn;
        self
    }

    pub fn radius_point(&self) -> &Point3<T> {
        &self.radius_point
    }

    pub fn pitch(&self) -> T {
        self.pitch
    }

    pub fn turn_count(&self) -> Option<T> {
        self.turn_count
    }

    pub fn start_radius(&self) -> Option<T> {
        self.start_radius
    }

    pub fn end_radius(&self) -> Option<T> {
        self.end_radius
    }

    pub fn points_per_turn(&self) -> usize {
        self.points_per_turn
    }

    /// Wind around the line through `axis_start` along `axis_direction`
    /// The turn count is required and the spiral is flat when the pitch is zero.
    pub fn try_around_axis(
        &self,
        axis_start: &Point3<T>,
        axis_direction: &Vector3<T>,
    ) -> anyhow::Result<NurbsCurve<T>> {
        let axis = axis_direction
            .try_normalize(T::default_epsilon())
            .context("spiral axis direction is zero")?;
        let turns = self.turn_count.context("spiral turn count is not set")?;
        anyhow::ensure!(turns > T::zero(), "turn count must be positive, got {}", turns);

        let offset = self.radius_point - axis_start;
        let radial = offset - axis * axis.dot(&offset);
        let distance = radial.norm();
        let plane = Plane::try_new(*axis_start, radial, axis.cross(&radial))
            .context("radius point lies on the spiral axis")?;
        let (r0, r1) = self.radii(distance)?;

        let tau = real::<T>(std::f64::consts::TAU);
        let points = self
            .samples(turns)?
            .into_iter()
            .map(|s| {
                let angle = tau * turns * s;
                let radius = r0 + (r1 - r0) * s;
                let p = plane.point_at(radius * angle.cos(), radius * angle.sin())
                    + axis * (self.pitch * turns * s);
                DVector::from_column_slice(p.coords.as_slice())
            })
            .collect::<Vec<_>>();

        self.fit(&points)
    }

    /// Wind around the part `domain` of a 3D rail curve
    /// Without a turn count, the number of turns is the rail length divided by the pitch.
    pub fn try_along_rail(
        &self,
        rail: &NurbsCurve<T>,
        domain: (T, T),
    ) -> anyhow::Result<NurbsCurve<T>> {
        let (t0, t1) = rail.domain();
        anyhow::ensure!(
            t0 <= domain.0 && domain.0 < domain.1 && domain.1 <= t1,
            "rail sub domain ({}, {}) is outside ({}, {})",
            domain.0,
            domain.1,
            t0,
            t1
        );

        let turns = match self.turn_count {
            Some(turns) => turns,
            None => {
                anyhow::ensure!(
                    self.pitch > T::zero(),
                    "either a turn count or a positive pitch is required"
                );
                let length = rail.try_length_between(domain.0, domain.1)?;
                anyhow::ensure!(length > T::zero(), "rail has no length");
                length / self.pitch
            }
        };
        anyhow::ensure!(turns > T::zero(), "turn count must be positive, got {}", turns);

        let samples = self.samples(turns)?;
        let parameters = samples
            .iter()
            .map(|s| domain.0 + (domain.1 - domain.0) * *s)
            .collect::<Vec<_>>();
        let frames = rail
            .try_frenet_frames(&parameters)
            .context("failed to transport frames along the rail")?;

        let (x, y) = frames[0].project(&self.radius_point);
        let distance = (x * x + y * y).sqrt();
        anyhow::ensure!(
            distance > T::default_epsilon(),
            "radius point lies on the rail"
        );
        let phase = y.atan2(x);
        let (r0, r1) = self.radii(distance)?;

        let tau = real::<T>(std::f64::consts::TAU);
        let points = samples
            .iter()
            .zip(frames.iter())
            .map(|(s, frame)| {
                let angle = phase + tau * turns * *s;
                let radius = r0 + (r1 - r0) * *s;
                let p = frame.point_at(radius * angle.cos(), radius * angle.sin());
                DVector::from_column_slice(p.coords.as_slice())
            })
            .collect::<Vec<_>>();

        self.fit(&points)
    }

    fn radii(&self, distance: T) -> anyhow::Result<(T, T)> {
        let r0 = self.start_radius.unwrap_or(distance);
        let r1 = self.end_radius.unwrap_or(r0);
        anyhow::ensure!(
            r0 >= T::zero() && r1 >= T::zero() && (r0 > T::zero() || r1 > T::zero()),
            "spiral radii {} and {} must not be negative or both zero",
            r0,
            r1
        );
        Ok((r0, r1))
    }

    /// Normalized sample positions in `[0, 1]`
    fn samples(&self, turns: T) -> anyhow::Result<Vec<T>> {
        anyhow::ensure!(
            self.points_per_turn >= 4,
            "at least 4 points per turn are required, got {}",
            self.points_per_turn
        );
        let count = (turns * real::<T>(self.points_per_turn as f64))
            .ceil()
            .to_usize()
            .context("turn count is too large")?
            .max(4);
        let inv = T::one() / real::<T>(count as f64);
        Ok((0..=count).map(|i| real::<T>(i as f64) * inv).collect())
    }

    fn fit(&self, points: &[DVector<T>]) -> anyhow::Result<NurbsCurve<T>> {
        let curve = NurbsCurve::try_interpolate(points, 3).context("failed to fit the spiral")?;
        curve.validate().context("spiral curve is invalid")?;
        log::debug!("created spiral through {} points", points.len());
        Ok(curve)
    }
}
