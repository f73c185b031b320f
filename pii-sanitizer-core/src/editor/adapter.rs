//! Extraction and injection of (text, caret) per editor variant.
//!
//! `extract` and `render` are pure and keyed by `EditorKind`; `read_state`
//! and `inject` are the only functions that touch the element.
//!
//! Offsets in the generic variant are relative to the first text node only.
//! For regions with nested formatting this is approximate, and it is kept
//! that way: nested content has no defined caret mapping.

use log::{debug, warn};

use crate::cursor::char_len;
use crate::dom::{CaretScope, EditableElement, ParagraphNode};
use crate::editor::EditorKind;
use crate::errors::SanitizerError;

/// Zero-width space the paragraph editors insert as a caret holder.
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';
/// Class the prompt editor puts on the break inside an empty paragraph.
pub const TRAILING_BREAK_CLASS: &str = "ProseMirror-trailingBreak";

/// Raw element state as read from the page, per variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceState {
    Field { value: String, selection_start: Option<usize> },
    Paragraphs { texts: Vec<String> },
    Opaque { text: String, caret: Option<usize> },
}

/// The uniform representation the engine works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub cursor: Option<usize>,
}

/// What to write back into a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    Field { value: String, caret: Option<usize> },
    /// The caret always goes to the end of the last paragraph.
    Paragraphs { nodes: Vec<ParagraphNode> },
    Opaque { text: String, caret: Option<usize> },
}

pub fn read_state<E: EditableElement>(kind: EditorKind, element: &E) -> Result<SurfaceState, SanitizerError> {
    match kind {
        EditorKind::PlainField => {
            let value = element
                .value()
                .ok_or_else(|| SanitizerError::Extraction("form field exposes no value".to_string()))?;
            Ok(SurfaceState::Field { value, selection_start: element.selection_start() })
        }
        EditorKind::ProseMirrorPrompt | EditorKind::ProseMirrorComposer => {
            Ok(SurfaceState::Paragraphs { texts: element.paragraph_texts() })
        }
        EditorKind::GenericEditable => Ok(SurfaceState::Opaque {
            text: element.text_content(),
            caret: element.caret_offset(),
        }),
    }
}

/// Builds the engine's (text, caret) pair from a surface state.
///
/// Paragraph editors report no caret: their injection always places it at
/// the end of the content.
pub fn extract(state: &SurfaceState) -> Extracted {
    match state {
        SurfaceState::Field { value, selection_start } => Extracted {
            text: value.clone(),
            cursor: *selection_start,
        },
        SurfaceState::Paragraphs { texts } => Extracted {
            text: texts
                .iter()
                .map(|t| t.replace(ZERO_WIDTH_SPACE, ""))
                .collect::<Vec<_>>()
                .join("\n"),
            cursor: None,
        },
        SurfaceState::Opaque { text, caret } => Extracted { text: text.clone(), cursor: *caret },
    }
}

/// Lays `text` out for the given variant.
pub fn render(kind: EditorKind, text: &str, cursor: Option<usize>) -> Injection {
    let clamp = |c: usize| c.min(char_len(text));
    match kind {
        EditorKind::PlainField => Injection::Field {
            value: text.to_string(),
            caret: cursor.map(clamp),
        },
        EditorKind::ProseMirrorPrompt => Injection::Paragraphs {
            nodes: text
                .split('\n')
                .map(|line| {
                    if line.is_empty() {
                        ParagraphNode::LineBreak { class: Some(TRAILING_BREAK_CLASS.to_string()) }
                    } else {
                        ParagraphNode::Text(line.to_string())
                    }
                })
                .collect(),
        },
        EditorKind::ProseMirrorComposer => {
            let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
            Injection::Paragraphs {
                nodes: normalized
                    .split('\n')
                    .map(|line| {
                        if line.is_empty() {
                            ParagraphNode::LineBreak { class: None }
                        } else {
                            ParagraphNode::Text(line.to_string())
                        }
                    })
                    .collect(),
            }
        }
        EditorKind::GenericEditable => Injection::Opaque {
            text: text.to_string(),
            caret: cursor.map(clamp),
        },
    }
}

/// Writes an injection into the element. Caret failures fall back to the
/// end of the element and are never propagated.
pub fn inject<E: EditableElement>(element: &E, injection: &Injection) {
    match injection {
        Injection::Field { value, caret } => {
            element.set_value(value);
            if let Some(caret) = *caret {
                if let Err(e) = element.set_selection_range(caret, caret) {
                    warn!("Error setting cursor position: {}", e);
                    let end = char_len(value);
                    if let Err(e) = element.set_selection_range(end, end) {
                        warn!("Could not move the cursor to the end of the field: {}", e);
                    }
                }
            }
        }
        Injection::Paragraphs { nodes } => {
            element.replace_paragraphs(nodes);
            place_or_fall_back(element, element.collapse_caret_to_end(CaretScope::LastBlock));
        }
        Injection::Opaque { text, caret } => {
            element.set_text_content(text);
            if let Some(caret) = *caret {
                place_or_fall_back(element, element.place_caret_in_first_text(caret));
            }
        }
    }
    debug!("Injected rewrite into surface {:?}.", element.surface_id());
}

fn place_or_fall_back<E: EditableElement>(element: &E, placed: Result<(), SanitizerError>) {
    if let Err(e) = placed {
        warn!("Error setting cursor position: {}", e);
        if let Err(e) = element.collapse_caret_to_end(CaretScope::Whole) {
            warn!("Could not collapse the selection to the end of the surface: {}", e);
        }
    }
}
