//! In-memory implementation of the page ports.
//!
//! `MemoryPage` and `MemoryElement` model just enough of a document to run
//! the whole monitor headless: form values and selections, paragraph
//! children, plain text content, classes, `data-*` markers and listener
//! bookkeeping. Handles are cheap clones sharing the same element, so a
//! test can keep one while the monitor owns the page.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::cursor::char_len;
use crate::dom::{
    CaretScope, EditableElement, ElementDescriptor, ElementTag, Page, ParagraphNode, SurfaceId,
};
use crate::editor::{PROMPT_EDITOR_ID, PROSEMIRROR_CLASS};
use crate::errors::SanitizerError;

/// What an element holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Field(String),
    Paragraphs(Vec<ParagraphNode>),
    Text(String),
}

impl Content {
    fn text_content(&self) -> String {
        match self {
            Content::Field(_) => String::new(),
            Content::Paragraphs(nodes) => nodes.iter().map(paragraph_text).collect(),
            Content::Text(text) => text.clone(),
        }
    }
}

fn paragraph_text(node: &ParagraphNode) -> &str {
    match node {
        ParagraphNode::Text(text) => text,
        ParagraphNode::LineBreak { .. } => "",
    }
}

#[derive(Debug)]
struct ElementData {
    id: SurfaceId,
    descriptor: ElementDescriptor,
    content: Content,
    selection: Option<(usize, usize)>,
    caret: Option<usize>,
    collapsed_to: Option<CaretScope>,
    listeners_attached: bool,
    listener_attachments: usize,
    fail_caret_placement: bool,
    guard_probe: Option<Rc<Cell<bool>>>,
    writes: Vec<bool>,
}

#[derive(Debug, Clone)]
pub struct MemoryElement {
    inner: Rc<RefCell<ElementData>>,
}

impl MemoryElement {
    fn new(id: SurfaceId, descriptor: ElementDescriptor, content: Content) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ElementData {
                id,
                descriptor,
                content,
                selection: None,
                caret: None,
                collapsed_to: None,
                listeners_attached: false,
                listener_attachments: 0,
                fail_caret_placement: false,
                guard_probe: None,
                writes: Vec::new(),
            })),
        }
    }

    /// Simulates the user typing into a form field.
    pub fn type_value(&self, value: &str, caret: usize) {
        let mut data = self.inner.borrow_mut();
        data.content = Content::Field(value.to_string());
        data.selection = Some((caret, caret));
    }

    /// Simulates the host editor rendering one paragraph per line.
    pub fn set_paragraphs(&self, lines: &[&str]) {
        let nodes = lines
            .iter()
            .map(|line| {
                if line.is_empty() {
                    ParagraphNode::LineBreak { class: None }
                } else {
                    ParagraphNode::Text(line.to_string())
                }
            })
            .collect();
        self.inner.borrow_mut().content = Content::Paragraphs(nodes);
    }

    /// Simulates typing into a generic editable region.
    pub fn set_text(&self, text: &str, caret: Option<usize>) {
        let mut data = self.inner.borrow_mut();
        data.content = Content::Text(text.to_string());
        data.caret = caret;
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        let mut data = self.inner.borrow_mut();
        data.descriptor.attributes.insert(name.to_string(), value.to_string());
        if name == "contenteditable" {
            data.descriptor.content_editable = value == "true";
        }
    }

    /// Makes every caret placement on this element fail.
    pub fn fail_caret_placement(&self, fail: bool) {
        self.inner.borrow_mut().fail_caret_placement = fail;
    }

    /// Records the re-entrancy flag's value at each content write.
    pub fn probe_guard(&self, flag: Rc<Cell<bool>>) {
        self.inner.borrow_mut().guard_probe = Some(flag);
    }

    /// Flag values seen at each content write, in order.
    pub fn writes(&self) -> Vec<bool> {
        self.inner.borrow().writes.clone()
    }

    pub fn content(&self) -> Content {
        self.inner.borrow().content.clone()
    }

    pub fn field_value(&self) -> Option<String> {
        match &self.inner.borrow().content {
            Content::Field(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<(usize, usize)> {
        self.inner.borrow().selection
    }

    pub fn caret(&self) -> Option<usize> {
        self.inner.borrow().caret
    }

    /// Scope of the last collapse-to-end placement.
    pub fn collapsed_to(&self) -> Option<CaretScope> {
        self.inner.borrow().collapsed_to
    }

    pub fn listeners_attached(&self) -> bool {
        self.inner.borrow().listeners_attached
    }

    /// How many times listeners were attached.
    pub fn listener_attachments(&self) -> usize {
        self.inner.borrow().listener_attachments
    }

}

/// Bookkeeping shared by every content write: a rewrite drops the selection.
fn record_write(data: &mut ElementData) {
    if let Some(probe) = &data.guard_probe {
        let seen = probe.get();
        data.writes.push(seen);
    }
    data.selection = None;
    data.caret = None;
    data.collapsed_to = None;
}

impl EditableElement for MemoryElement {
    fn surface_id(&self) -> SurfaceId {
        self.inner.borrow().id
    }

    fn describe(&self) -> ElementDescriptor {
        self.inner.borrow().descriptor.clone()
    }

    fn value(&self) -> Option<String> {
        self.field_value()
    }

    fn selection_start(&self) -> Option<usize> {
        self.inner.borrow().selection.map(|(start, _)| start)
    }

    fn set_value(&self, value: &str) {
        let mut data = self.inner.borrow_mut();
        record_write(&mut data);
        data.content = Content::Field(value.to_string());
    }

    fn set_selection_range(&self, start: usize, end: usize) -> Result<(), SanitizerError> {
        let mut data = self.inner.borrow_mut();
        if data.fail_caret_placement {
            return Err(SanitizerError::CaretPlacement("selection range rejected".to_string()));
        }
        let Content::Field(value) = &data.content else {
            return Err(SanitizerError::CaretPlacement("element is not a form field".to_string()));
        };
        let len = char_len(value);
        data.selection = Some((start.min(len), end.min(len)));
        Ok(())
    }

    fn paragraph_texts(&self) -> Vec<String> {
        match &self.inner.borrow().content {
            Content::Paragraphs(nodes) => nodes.iter().map(|n| paragraph_text(n).to_string()).collect(),
            _ => Vec::new(),
        }
    }

    fn text_content(&self) -> String {
        self.inner.borrow().content.text_content()
    }

    fn caret_offset(&self) -> Option<usize> {
        self.inner.borrow().caret
    }

    fn replace_paragraphs(&self, paragraphs: &[ParagraphNode]) {
        let mut data = self.inner.borrow_mut();
        record_write(&mut data);
        data.content = Content::Paragraphs(paragraphs.to_vec());
    }

    fn set_text_content(&self, text: &str) {
        let mut data = self.inner.borrow_mut();
        record_write(&mut data);
        data.content = Content::Text(text.to_string());
    }

    fn place_caret_in_first_text(&self, offset: usize) -> Result<(), SanitizerError> {
        let mut data = self.inner.borrow_mut();
        if data.fail_caret_placement {
            return Err(SanitizerError::CaretPlacement("range rejected".to_string()));
        }
        let first_text_len = match &data.content {
            Content::Text(text) if !text.is_empty() => char_len(text),
            _ => return Err(SanitizerError::CaretPlacement("no text node".to_string())),
        };
        if offset > first_text_len {
            return Err(SanitizerError::CaretPlacement(format!(
                "offset {} beyond text node of length {}",
                offset, first_text_len
            )));
        }
        data.caret = Some(offset);
        Ok(())
    }

    fn collapse_caret_to_end(&self, scope: CaretScope) -> Result<(), SanitizerError> {
        let mut data = self.inner.borrow_mut();
        if data.fail_caret_placement && scope == CaretScope::LastBlock {
            return Err(SanitizerError::CaretPlacement("no last block".to_string()));
        }
        let end = char_len(&data.content.text_content());
        data.caret = Some(end);
        data.collapsed_to = Some(scope);
        Ok(())
    }

    fn add_class(&self, class: &str) {
        let mut data = self.inner.borrow_mut();
        if !data.descriptor.has_class(class) {
            data.descriptor.classes.push(class.to_string());
        }
    }

    fn data(&self, key: &str) -> Option<String> {
        self.inner.borrow().descriptor.attribute(&format!("data-{}", key)).map(str::to_string)
    }

    fn set_data(&self, key: &str, value: Option<&str>) {
        let name = format!("data-{}", key);
        let mut data = self.inner.borrow_mut();
        match value {
            Some(value) => {
                data.descriptor.attributes.insert(name, value.to_string());
            }
            None => {
                data.descriptor.attributes.remove(&name);
            }
        }
    }

    fn attach_listeners(&self) {
        let mut data = self.inner.borrow_mut();
        data.listeners_attached = true;
        data.listener_attachments += 1;
    }

    fn detach_listeners(&self) {
        self.inner.borrow_mut().listeners_attached = false;
    }
}

#[derive(Debug, Default)]
struct PageData {
    hostname: String,
    elements: Vec<MemoryElement>,
    styles: Vec<String>,
    observing: bool,
    next_id: u64,
}

/// A page made of `MemoryElement`s.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    inner: Rc<RefCell<PageData>>,
}

impl MemoryPage {
    pub fn new(hostname: &str) -> Self {
        let page = Self::default();
        page.inner.borrow_mut().hostname = hostname.to_string();
        page
    }

    /// Adds an element to the page.
    pub fn insert(&self, descriptor: ElementDescriptor, content: Content) -> MemoryElement {
        let mut data = self.inner.borrow_mut();
        data.next_id += 1;
        let element = MemoryElement::new(SurfaceId(data.next_id), descriptor, content);
        data.elements.push(element.clone());
        element
    }

    pub fn add_text_input(&self) -> MemoryElement {
        self.insert(
            ElementDescriptor::new(ElementTag::Input { input_type: "text".to_string() }),
            Content::Field(String::new()),
        )
    }

    pub fn add_textarea(&self) -> MemoryElement {
        self.insert(ElementDescriptor::new(ElementTag::TextArea), Content::Field(String::new()))
    }

    /// The id-identified paragraph editor.
    pub fn add_prompt_editor(&self) -> MemoryElement {
        self.insert(
            ElementDescriptor::new(ElementTag::Div)
                .with_id(PROMPT_EDITOR_ID)
                .with_class(PROSEMIRROR_CLASS)
                .editable(),
            Content::Paragraphs(Vec::new()),
        )
    }

    /// The host-identified paragraph editor.
    pub fn add_composer(&self) -> MemoryElement {
        self.insert(
            ElementDescriptor::new(ElementTag::Div).with_class(PROSEMIRROR_CLASS).editable(),
            Content::Paragraphs(Vec::new()),
        )
    }

    pub fn add_editable_div(&self) -> MemoryElement {
        self.insert(ElementDescriptor::new(ElementTag::Div).editable(), Content::Text(String::new()))
    }

    /// Removes an element, as when the page re-renders it away.
    pub fn remove(&self, id: SurfaceId) {
        self.inner.borrow_mut().elements.retain(|e| e.surface_id() != id);
    }

    pub fn styles(&self) -> Vec<String> {
        self.inner.borrow().styles.clone()
    }

    pub fn is_observing(&self) -> bool {
        self.inner.borrow().observing
    }
}

impl Page for MemoryPage {
    type Element = MemoryElement;

    fn hostname(&self) -> String {
        self.inner.borrow().hostname.clone()
    }

    fn candidates(&self) -> Vec<MemoryElement> {
        self.inner
            .borrow()
            .elements
            .iter()
            .filter(|e| {
                let desc = e.describe();
                desc.is_text_input() || desc.tag == ElementTag::TextArea || desc.is_editable_div()
            })
            .cloned()
            .collect()
    }

    fn element(&self, id: SurfaceId) -> Option<MemoryElement> {
        self.inner.borrow().elements.iter().find(|e| e.surface_id() == id).cloned()
    }

    fn inject_style(&self, css: &str) {
        self.inner.borrow_mut().styles.push(css.to_string());
    }

    fn observe_structure(&self) {
        self.inner.borrow_mut().observing = true;
    }
}
