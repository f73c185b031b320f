//! The cosmetic stylesheet that marks monitored surfaces.

/// Border colour of a monitored surface.
pub const MONITORED_BORDER: &str = "#22c55e";
/// Border colour of a focused monitored surface.
pub const MONITORED_FOCUS_BORDER: &str = "#16a34a";

/// Builds the stylesheet for elements carrying `class`.
pub fn monitored_stylesheet(class: &str) -> String {
    format!(
        ".{class} {{\n  border: 2px solid {MONITORED_BORDER} !important;\n  transition: border-color 0.3s ease;\n  border-radius: 5px;\n}}\n\
         .{class}:focus {{\n  border-color: {MONITORED_FOCUS_BORDER} !important;\n  border-radius: 5px;\n}}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_targets_class_and_focus_state() {
        let css = monitored_stylesheet("pii-monitored");
        assert!(css.contains(".pii-monitored {"));
        assert!(css.contains(".pii-monitored:focus {"));
        assert!(css.contains(MONITORED_BORDER));
        assert!(css.contains(MONITORED_FOCUS_BORDER));
    }
}
