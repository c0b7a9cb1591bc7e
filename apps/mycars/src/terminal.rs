//! Plain-text display sink.

use std::io::Write;

use catalog::{CarView, DisplaySink, Notice, Rgba};

pub struct TerminalSink<W: Write> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_view(&mut self, view: &CarView) -> std::io::Result<()> {
        let badge = if view.favorite_visible { "  [my choice]" } else { "" };
        writeln!(self.out, "== {} {}{badge}", view.mark, view.model)?;
        writeln!(self.out, "{}", view.rating_text)?;
        writeln!(self.out, "{}", view.trips_text)?;
        if let Some(last_started) = &view.last_started_text {
            writeln!(self.out, "{last_started}")?;
        }
        if let Some(image) = &view.image {
            writeln!(self.out, "Image: {}x{}", image.width, image.height)?;
        }
        if let Some(background) = view.background {
            writeln!(self.out, "Color: {}", hex_color(background))?;
        }
        self.out.flush()
    }
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn show(&mut self, view: &CarView) {
        if let Err(error) = self.write_view(view) {
            tracing::warn!(%error, "failed to write car view");
        }
    }

    fn notify(&mut self, notice: &Notice) {
        if let Err(error) = writeln!(self.out, "! {}: {}", notice.title, notice.message) {
            tracing::warn!(%error, "failed to write notice");
        }
    }
}

fn hex_color(color: Rgba) -> String {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02X}{:02X}{:02X}",
        channel(color.red),
        channel(color.green),
        channel(color.blue)
    )
}
