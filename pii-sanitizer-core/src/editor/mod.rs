//! Editor variant classification and the surface qualification predicate.
//!
//! Classification is purely structural: tag, id, classes and attributes.
//! Each variant has its own extraction and injection in `adapter`.

pub mod adapter;

use crate::dom::{ElementDescriptor, ElementTag};

/// Class the ProseMirror-based chat editors put on their edit region.
pub const PROSEMIRROR_CLASS: &str = "ProseMirror";
/// Id of the prompt editor (variant A).
pub const PROMPT_EDITOR_ID: &str = "prompt-textarea";
/// Host of the composer editor (variant B).
pub const COMPOSER_HOST: &str = "claude.ai";

/// The closed set of editor variants the adapter knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    /// `<input>` or `<textarea>`, read through value/selection.
    PlainField,
    /// Paragraph-per-line editor identified by id; empty lines carry a
    /// trailing-break marker.
    ProseMirrorPrompt,
    /// Paragraph-per-line editor identified by host; empty lines carry a
    /// plain line break.
    ProseMirrorComposer,
    /// Any other editable region, treated as one opaque block of text.
    GenericEditable,
}

impl EditorKind {
    /// True for the variants that keep one paragraph per logical line.
    pub fn is_paragraph_structured(self) -> bool {
        matches!(self, EditorKind::ProseMirrorPrompt | EditorKind::ProseMirrorComposer)
    }
}

/// Maps an element to its editor variant, or `None` if it is not editable.
pub fn classify(desc: &ElementDescriptor, hostname: &str) -> Option<EditorKind> {
    if matches!(desc.tag, ElementTag::Input { .. } | ElementTag::TextArea) {
        return Some(EditorKind::PlainField);
    }
    if !desc.content_editable {
        return None;
    }
    if desc.id_is(PROMPT_EDITOR_ID) && desc.has_class(PROSEMIRROR_CLASS) {
        Some(EditorKind::ProseMirrorPrompt)
    } else if desc.has_class(PROSEMIRROR_CLASS) && hostname.contains(COMPOSER_HOST) {
        Some(EditorKind::ProseMirrorComposer)
    } else {
        Some(EditorKind::GenericEditable)
    }
}

/// The hidden textarea some editors keep for virtual keyboards. It mirrors
/// the real editor and must never be rewritten itself.
pub fn is_hidden_keyboard_proxy(desc: &ElementDescriptor) -> bool {
    desc.tag == ElementTag::TextArea
        && desc.display_none
        && desc.attribute("data-virtualkeyboard") == Some("true")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureTag {
    EditableDiv,
    TextArea,
    TextInput,
}

/// One structural signature of a supported edit region.
#[derive(Debug, Clone, Copy)]
struct Signature {
    tag: SignatureTag,
    id: Option<&'static str>,
    class: Option<&'static str>,
    /// `[name*="needle"]`
    attribute: Option<(&'static str, &'static str)>,
    /// Excludes elements hidden with an inline `display: none`.
    visible_only: bool,
}

impl Signature {
    const fn tag(tag: SignatureTag) -> Self {
        Self { tag, id: None, class: None, attribute: None, visible_only: false }
    }

    fn matches(&self, desc: &ElementDescriptor) -> bool {
        let tag_ok = match self.tag {
            SignatureTag::EditableDiv => desc.is_editable_div(),
            SignatureTag::TextArea => desc.tag == ElementTag::TextArea,
            SignatureTag::TextInput => desc.is_text_input(),
        };
        tag_ok
            && self.id.map_or(true, |id| desc.id_is(id))
            && self.class.map_or(true, |class| desc.has_class(class))
            && self.attribute.map_or(true, |(name, needle)| desc.attribute_contains(name, needle))
            && !(self.visible_only && desc.display_none)
    }
}

const SIGNATURES: &[Signature] = &[
    // ChatGPT prompt editor and its legacy textarea.
    Signature { id: Some(PROMPT_EDITOR_ID), ..Signature::tag(SignatureTag::EditableDiv) },
    Signature { class: Some("text-input"), visible_only: true, ..Signature::tag(SignatureTag::TextArea) },
    // Claude composer.
    Signature { attribute: Some(("placeholder", "Message Claude")), ..Signature::tag(SignatureTag::TextArea) },
    // Bard prompt.
    Signature { attribute: Some(("placeholder", "Enter a prompt")), ..Signature::tag(SignatureTag::TextArea) },
    Signature { attribute: Some(("aria-label", "Prompt")), ..Signature::tag(SignatureTag::EditableDiv) },
    // Generic fallbacks.
    Signature::tag(SignatureTag::EditableDiv),
    Signature::tag(SignatureTag::TextInput),
    Signature { visible_only: true, ..Signature::tag(SignatureTag::TextArea) },
];

/// Whether an element should become a monitored surface.
pub fn qualifies(desc: &ElementDescriptor) -> bool {
    if is_hidden_keyboard_proxy(desc) {
        return false;
    }
    SIGNATURES.iter().any(|signature| signature.matches(desc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_input() -> ElementDescriptor {
        ElementDescriptor::new(ElementTag::Input { input_type: "text".into() })
    }

    fn prompt_editor() -> ElementDescriptor {
        ElementDescriptor::new(ElementTag::Div)
            .with_id(PROMPT_EDITOR_ID)
            .with_class(PROSEMIRROR_CLASS)
            .editable()
    }

    #[test]
    fn test_classify_variants() {
        assert_eq!(classify(&text_input(), "example.org"), Some(EditorKind::PlainField));
        assert_eq!(
            classify(&ElementDescriptor::new(ElementTag::TextArea), "example.org"),
            Some(EditorKind::PlainField)
        );
        assert_eq!(classify(&prompt_editor(), "chatgpt.com"), Some(EditorKind::ProseMirrorPrompt));

        let composer = ElementDescriptor::new(ElementTag::Div).with_class(PROSEMIRROR_CLASS).editable();
        assert_eq!(classify(&composer, "claude.ai"), Some(EditorKind::ProseMirrorComposer));
        assert_eq!(classify(&composer, "chatgpt.com"), Some(EditorKind::GenericEditable));

        let plain_div = ElementDescriptor::new(ElementTag::Div);
        assert_eq!(classify(&plain_div, "claude.ai"), None);
    }

    #[test]
    fn test_hidden_keyboard_proxy_never_qualifies() {
        let proxy = ElementDescriptor::new(ElementTag::TextArea)
            .hidden()
            .with_attribute("data-virtualkeyboard", "true")
            .with_attribute("placeholder", "Message Claude");
        assert!(is_hidden_keyboard_proxy(&proxy));
        assert!(!qualifies(&proxy));
    }

    #[test]
    fn test_qualification_signatures() {
        assert!(qualifies(&text_input()));
        assert!(qualifies(&prompt_editor()));
        assert!(qualifies(&ElementDescriptor::new(ElementTag::TextArea)));
        assert!(!qualifies(&ElementDescriptor::new(ElementTag::TextArea).hidden()));
        assert!(qualifies(
            &ElementDescriptor::new(ElementTag::TextArea)
                .hidden()
                .with_attribute("placeholder", "Message Claude...")
        ));
        assert!(!qualifies(&ElementDescriptor::new(ElementTag::Input { input_type: "password".into() })));
        assert!(!qualifies(&ElementDescriptor::new(ElementTag::Div)));
        assert!(!qualifies(&ElementDescriptor::new(ElementTag::Other("span".into())).editable()));
    }
}
