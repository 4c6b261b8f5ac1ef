//! Presentation seam.
//!
//! The controller never renders anything. It pushes display directives into a
//! [`PresentationSink`]; the editing surface decides how to show them.

/// Receiver of display directives.
pub trait PresentationSink {
    /// Start a fresh display for a component.
    fn reset(&mut self, title: &str, dataref: &str, index: &str);

    /// Append a keyframe row.
    fn add_keyframe_row(&mut self, index: usize, value: &str, deletable: bool);

    /// Show the loop period field.
    fn add_loop(&mut self, value: &str);

    /// Append a hide/show rule row.
    fn add_hide_show_row(
        &mut self,
        index: usize,
        mode: &str,
        dataref: &str,
        dataref_index: &str,
        from: &str,
        to: &str,
    );

    /// Enable or disable editing and preview commands.
    fn set_enabled(&mut self, editable: bool, previewable: bool);

    /// Show the driver value reached by the preview.
    fn set_preview_value(&mut self, value: &str);

    /// Show whether the component is visible at the preview value.
    fn set_preview_visible(&mut self, visible: bool);

    /// The controller has closed; no more directives follow.
    fn closed(&mut self);
}

/// A recorded display directive.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    Reset {
        title: String,
        dataref: String,
        index: String,
    },
    KeyframeRow {
        index: usize,
        value: String,
        deletable: bool,
    },
    Loop(String),
    HideShowRow {
        index: usize,
        mode: String,
        dataref: String,
        dataref_index: String,
        from: String,
        to: String,
    },
    Enabled {
        editable: bool,
        previewable: bool,
    },
    PreviewValue(String),
    PreviewVisible(bool),
    Closed,
}

/// Recording sink: keeps every directive in order.
impl PresentationSink for Vec<Directive> {
    fn reset(&mut self, title: &str, dataref: &str, index: &str) {
        self.push(Directive::Reset {
            title: title.to_string(),
            dataref: dataref.to_string(),
            index: index.to_string(),
        });
    }

    fn add_keyframe_row(&mut self, index: usize, value: &str, deletable: bool) {
        self.push(Directive::KeyframeRow {
            index,
            value: value.to_string(),
            deletable,
        });
    }

    fn add_loop(&mut self, value: &str) {
        self.push(Directive::Loop(value.to_string()));
    }

    fn add_hide_show_row(
        &mut self,
        index: usize,
        mode: &str,
        dataref: &str,
        dataref_index: &str,
        from: &str,
        to: &str,
    ) {
        self.push(Directive::HideShowRow {
            index,
            mode: mode.to_string(),
            dataref: dataref.to_string(),
            dataref_index: dataref_index.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    fn set_enabled(&mut self, editable: bool, previewable: bool) {
        self.push(Directive::Enabled {
            editable,
            previewable,
        });
    }

    fn set_preview_value(&mut self, value: &str) {
        self.push(Directive::PreviewValue(value.to_string()));
    }

    fn set_preview_visible(&mut self, visible: bool) {
        self.push(Directive::PreviewVisible(visible));
    }

    fn closed(&mut self) {
        self.push(Directive::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_order() {
        let mut sink: Vec<Directive> = Vec::new();
        sink.reset("Animation: door", "sim/door", "");
        sink.add_keyframe_row(0, "0", false);
        sink.set_enabled(true, false);
        sink.closed();

        assert_eq!(sink.len(), 4);
        assert!(matches!(&sink[0], Directive::Reset { title, .. } if title == "Animation: door"));
        assert_eq!(
            sink[2],
            Directive::Enabled {
                editable: true,
                previewable: false
            }
        );
        assert_eq!(sink[3], Directive::Closed);
    }
}
