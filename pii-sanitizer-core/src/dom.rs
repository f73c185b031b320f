//! Ports between the engine and the host page.
//!
//! The engine never talks to a browser directly. The host (a content script
//! binding, or `memory::MemoryPage` in tests and headless replays) implements
//! `Page` and `EditableElement`, and forwards structural changes, input and
//! paste events and fired timers to `monitor::ContentMonitor`.

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashSet};

use crate::errors::SanitizerError;

/// Stable identity of an element for the lifetime of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// The element's tag, as far as classification cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementTag {
    Input { input_type: String },
    TextArea,
    Div,
    Other(String),
}

/// A structural description of an element: everything classification and
/// qualification look at, and nothing about its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDescriptor {
    pub tag: ElementTag,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    /// `isContentEditable` as computed by the page.
    pub content_editable: bool,
    /// Inline style contains `display: none`.
    pub display_none: bool,
}

impl ElementDescriptor {
    pub fn new(tag: ElementTag) -> Self {
        Self {
            tag,
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            content_editable: false,
            display_none: false,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn editable(mut self) -> Self {
        self.content_editable = true;
        self.attributes.insert("contenteditable".to_string(), "true".to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.display_none = true;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// `[name*="needle"]` semantics.
    pub fn attribute_contains(&self, name: &str, needle: &str) -> bool {
        self.attribute(name).map_or(false, |v| v.contains(needle))
    }

    pub fn id_is(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    pub fn is_text_input(&self) -> bool {
        matches!(&self.tag, ElementTag::Input { input_type } if input_type.eq_ignore_ascii_case("text"))
    }

    /// `div[contenteditable="true"]`
    pub fn is_editable_div(&self) -> bool {
        self.tag == ElementTag::Div && self.attribute("contenteditable") == Some("true")
    }
}

/// How a rendered paragraph is filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphNode {
    /// A paragraph holding one line of text.
    Text(String),
    /// An empty line: a paragraph holding a single line break, optionally
    /// carrying a class the host editor expects on it.
    LineBreak { class: Option<String> },
}

/// Where a caret placement collapses to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretScope {
    /// End of the element's last child block.
    LastBlock,
    /// End of the whole element.
    Whole,
}

/// A live handle to one element on the page.
///
/// Every offset crossing this trait counts characters (Unicode scalar
/// values). Browser selection APIs count UTF-16 code units, so a host backed
/// by a real DOM converts in both directions; otherwise a character outside
/// the BMP before the caret shifts every anchor by one.
pub trait EditableElement: Clone {
    fn surface_id(&self) -> SurfaceId;

    fn describe(&self) -> ElementDescriptor;

    /// Current value of a form field, `None` for other elements.
    fn value(&self) -> Option<String>;

    /// `selectionStart` of a form field, converted to characters.
    fn selection_start(&self) -> Option<usize>;

    fn set_value(&self, value: &str);

    /// Offsets are in characters; the host converts them to UTF-16.
    fn set_selection_range(&self, start: usize, end: usize) -> Result<(), SanitizerError>;

    /// Text content of each paragraph container, in document order.
    fn paragraph_texts(&self) -> Vec<String>;

    fn text_content(&self) -> String;

    /// Start offset of the current selection range in characters, if any.
    fn caret_offset(&self) -> Option<usize>;

    /// Replaces the element's children with one paragraph per node.
    fn replace_paragraphs(&self, paragraphs: &[ParagraphNode]);

    fn set_text_content(&self, text: &str);

    /// Collapses the selection at character `offset` inside the first child
    /// text node.
    fn place_caret_in_first_text(&self, offset: usize) -> Result<(), SanitizerError>;

    fn collapse_caret_to_end(&self, scope: CaretScope) -> Result<(), SanitizerError>;

    fn has_class(&self, class: &str) -> bool {
        self.describe().has_class(class)
    }

    fn add_class(&self, class: &str);

    /// Reads a `data-*` attribute (`key` without the prefix).
    fn data(&self, key: &str) -> Option<String>;

    /// Sets (`Some`) or removes (`None`) a `data-*` attribute.
    fn set_data(&self, key: &str, value: Option<&str>);

    /// Wires the host's `input` and `paste` events to the monitor.
    fn attach_listeners(&self);

    fn detach_listeners(&self);
}

/// The page the engine runs on.
pub trait Page {
    type Element: EditableElement;

    fn hostname(&self) -> String;

    /// `input[type="text"], textarea, div[contenteditable="true"]`
    fn candidates(&self) -> Vec<Self::Element>;

    /// Looks up a still-attached element.
    fn element(&self, id: SurfaceId) -> Option<Self::Element>;

    fn inject_style(&self, css: &str);

    /// Starts delivering structural changes of the document body to the monitor.
    fn observe_structure(&self);
}

/// Attributes whose changes can make an element qualify.
pub static OBSERVED_ATTRIBUTES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["contenteditable", "class", "id", "style"].into_iter().collect());

/// One structural change reported by the host's observer.
#[derive(Debug, Clone)]
pub enum MutationRecord<E> {
    ChildList { added: usize },
    Attributes { target: E, attribute: String },
}
