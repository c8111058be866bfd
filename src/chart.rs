//! Rolling sample window and the line plot layout drawn from it.

use std::collections::VecDeque;

use super::config::PlotConfig;

pub const DEFAULT_CAPACITY: usize = 200;

/// Fixed-capacity FIFO; pushing into a full window drops the oldest sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }
}

/// Angle of the pointer position as seen from the container origin.
/// Note the argument order: x is the first operand.
pub fn pointer_sample(x: f32, y: f32) -> f32 {
    x.atan2(y)
}

pub fn extent(samples: impl IntoIterator<Item = f32>) -> Option<(f32, f32)> {
    samples
        .into_iter()
        .filter(|s| !s.is_nan())
        .fold(None, |acc, s| match acc {
            None => Some((s, s)),
            Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
        })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f32, f32),
    pub range: (f32, f32),
}

impl LinearScale {
    pub fn new(domain: (f32, f32), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    /// A zero-width domain maps everything to the middle of the range.
    pub fn map(&self, value: f32) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        let t = if span == 0.0 { 0.5 } else { (value - d0) / span };
        r0 + (r1 - r0) * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePlot {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub marker_radius: f32,
}

impl Default for LinePlot {
    fn default() -> Self {
        Self::from_config(&PlotConfig::default())
    }
}

/// Plot-space geometry, origin top-left, y down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotLayout {
    pub line: Vec<glam::Vec2>,
    pub markers: Vec<glam::Vec2>,
}

impl LinePlot {
    pub fn from_config(config: &PlotConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            margin_top: config.margin_top,
            margin_right: config.margin_right,
            margin_bottom: config.margin_bottom,
            margin_left: config.margin_left,
            marker_radius: config.marker_radius,
        }
    }

    pub fn x_scale(&self, len: usize) -> LinearScale {
        LinearScale::new(
            (0.0, len.saturating_sub(1) as f32),
            (self.margin_left, self.width - self.margin_right),
        )
    }

    pub fn y_scale(&self, extent: (f32, f32)) -> LinearScale {
        LinearScale::new(extent, (self.height - self.margin_bottom, self.margin_top))
    }

    pub fn layout(&self, window: &RollingWindow) -> PlotLayout {
        let Some(ext) = extent(window.iter()) else {
            return PlotLayout::default();
        };
        let x = self.x_scale(window.len());
        let y = self.y_scale(ext);
        let points: Vec<glam::Vec2> = window
            .iter()
            .enumerate()
            .map(|(i, s)| glam::Vec2::new(x.map(i as f32), y.map(s)))
            .collect();
        PlotLayout {
            line: points.clone(),
            markers: points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_never_exceeds_capacity() {
        let mut window = RollingWindow::default();
        for i in 0..500 {
            window.push(i as f32);
            assert!(window.len() <= 200);
        }
        assert_eq!(window.len(), 200);
        assert_eq!(window.iter().next(), Some(300.0));
        assert_eq!(window.iter().last(), Some(499.0));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut window = RollingWindow::new(0);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.iter().collect::<Vec<_>>(), [2.0]);
    }

    #[test]
    fn sample_uses_x_first() {
        assert!((pointer_sample(1.0, 0.0) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(pointer_sample(0.0, 1.0), 0.0);
    }

    #[test]
    fn extent_of_samples() {
        assert_eq!(extent([3.0, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(extent(std::iter::empty()), None);
        assert_eq!(extent([f32::NAN, 4.0]), Some((4.0, 4.0)));
    }

    #[test]
    fn scale_maps_and_inverts_range() {
        let s = LinearScale::new((0.0, 10.0), (380.0, 20.0));
        assert_eq!(s.map(0.0), 380.0);
        assert_eq!(s.map(10.0), 20.0);
        assert_eq!(s.map(5.0), 200.0);
        assert_eq!(LinearScale::new((2.0, 2.0), (0.0, 100.0)).map(2.0), 50.0);
    }

    #[test]
    fn layout_spans_inner_area() {
        let plot = LinePlot::default();
        let mut window = RollingWindow::default();
        for s in [0.0, 1.0, 0.5] {
            window.push(s);
        }
        let layout = plot.layout(&window);
        assert_eq!(layout.line.len(), 3);
        assert_eq!(layout.line[0], glam::Vec2::new(20.0, 380.0));
        assert_eq!(layout.line[1], glam::Vec2::new(320.0, 20.0));
        assert_eq!(layout.line[2], glam::Vec2::new(620.0, 200.0));
        assert_eq!(layout.markers, layout.line);
    }

    #[test]
    fn single_sample_sits_mid_height() {
        let mut window = RollingWindow::default();
        window.push(0.3);
        let layout = LinePlot::default().layout(&window);
        assert_eq!(layout.line, [glam::Vec2::new(320.0, 200.0)]);
    }

    #[test]
    fn empty_window_draws_nothing() {
        assert_eq!(LinePlot::default().layout(&RollingWindow::default()), PlotLayout::default());
    }
}
