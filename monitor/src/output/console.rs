use presencecore::dispatch::{RenderFrame, RenderSink};

/// Human-readable status for a render frame.
pub fn status_line(frame: &RenderFrame) -> String {
    match &frame.target {
        Some(target) => format!(
            "Target: {:.2}m at {:.1}° | Energy: {}",
            target.distance_meters, target.azimuth_degrees, target.energy
        ),
        None => "Scanning... No person detected.".to_string(),
    }
}

/// Prints the status line whenever it changes.
#[derive(Default)]
pub struct ConsoleRenderer {
    last_line: Option<String>,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the line if it differs from the previously rendered one.
    fn next_line(&mut self, frame: &RenderFrame) -> Option<String> {
        let line = status_line(frame);
        if self.last_line.as_deref() == Some(line.as_str()) {
            return None;
        }
        self.last_line = Some(line.clone());
        Some(line)
    }
}

impl RenderSink for ConsoleRenderer {
    fn render(&mut self, frame: &RenderFrame) {
        if let Some(line) = self.next_line(frame) {
            println!("[MONITOR] {}", line);
        }
    }
}

/// Forwards each frame to several renderers in order.
pub struct RenderFanout {
    sinks: Vec<Box<dyn RenderSink>>,
}

impl RenderFanout {
    pub fn new(sinks: Vec<Box<dyn RenderSink>>) -> Self {
        Self { sinks }
    }
}

impl RenderSink for RenderFanout {
    fn render(&mut self, frame: &RenderFrame) {
        for sink in &mut self.sinks {
            sink.render(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presencecore::dispatch::TargetView;
    use std::sync::{Arc, Mutex};

    fn target_frame(distance: f32) -> RenderFrame {
        RenderFrame {
            target: Some(TargetView {
                distance_meters: distance,
                energy: 120,
                azimuth_degrees: 45.0,
            }),
            max_range_meters: 10.0,
        }
    }

    #[test]
    fn status_line_describes_target_or_scanning() {
        assert_eq!(
            status_line(&target_frame(3.5)),
            "Target: 3.50m at 45.0° | Energy: 120"
        );
        let absent = RenderFrame {
            target: None,
            max_range_meters: 10.0,
        };
        assert_eq!(status_line(&absent), "Scanning... No person detected.");
    }

    #[test]
    fn console_skips_repeated_lines() {
        let mut console = ConsoleRenderer::new();
        assert!(console.next_line(&target_frame(3.5)).is_some());
        assert!(console.next_line(&target_frame(3.5)).is_none());
        assert!(console.next_line(&target_frame(3.6)).is_some());
    }

    struct Counting(Arc<Mutex<usize>>);

    impl RenderSink for Counting {
        fn render(&mut self, _frame: &RenderFrame) {
            *self.0.lock().unwrap() += 1;
        }
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let count = Arc::new(Mutex::new(0));
        let mut fanout = RenderFanout::new(vec![
            Box::new(Counting(Arc::clone(&count))),
            Box::new(Counting(Arc::clone(&count))),
        ]);
        fanout.render(&target_frame(1.0));
        assert_eq!(*count.lock().unwrap(), 2);
    }
}
