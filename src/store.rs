//! The document store: sole owner of the page list and the selected-page
//! pointer.

use crate::error::StoreError;
use crate::model::{Document, Page, PageKey, SegmentData, StrokeSegment, TextBox, page_name};

/// Change notification emitted after every successful mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    PageAdded(PageKey),
    PageUpdated(PageKey),
    PageDeleted(PageKey),
    PageSelected(Option<PageKey>),
}

pub type StoreListener = Box<dyn FnMut(&StoreEvent)>;

/// Partial page update. `None` fields are left untouched; the key is never
/// patchable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PagePatch {
    pub name: Option<String>,
    pub order: Option<u32>,
    pub source_image: Option<String>,
    pub text_boxes: Option<Vec<TextBox>>,
    pub segment_data: Option<Vec<SegmentData>>,
    pub lines: Option<Vec<StrokeSegment>>,
}

impl PagePatch {
    fn apply(self, page: &mut Page) {
        if let Some(name) = self.name {
            page.name = name;
        }
        if let Some(order) = self.order {
            page.order = order;
        }
        if let Some(source_image) = self.source_image {
            page.source_image = source_image;
        }
        if let Some(text_boxes) = self.text_boxes {
            page.text_boxes = text_boxes;
        }
        if let Some(segment_data) = self.segment_data {
            page.segment_data = segment_data;
        }
        if let Some(lines) = self.lines {
            page.lines = lines;
        }
    }
}

pub struct DocumentStore {
    doc: Document,
    revision: u64,
    listeners: Vec<StoreListener>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(Document::default())
    }
}

impl DocumentStore {
    pub fn new(mut doc: Document) -> Self {
        let dangling = doc
            .selected_page_key
            .is_some_and(|k| doc.page(k).is_none());
        if dangling || (doc.selected_page_key.is_none() && !doc.pages.is_empty()) {
            doc.selected_page_key = doc.pages.first().map(|p| p.key);
        }
        Self {
            doc,
            revision: 0,
            listeners: Vec::new(),
        }
    }

    pub fn from_pages(pages: Vec<Page>) -> Self {
        Self::new(Document::new(pages))
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn pages(&self) -> &[Page] {
        &self.doc.pages
    }

    pub fn page(&self, key: PageKey) -> Option<&Page> {
        self.doc.page(key)
    }

    pub fn selected_page_key(&self) -> Option<PageKey> {
        self.doc.selected_page_key
    }

    pub fn selected_page(&self) -> Option<&Page> {
        self.doc.selected_page()
    }

    /// Bumped on every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: StoreEvent) {
        self.revision += 1;
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    /// Appends a fresh page and makes it the selected one.
    pub fn add_page(&mut self, source_image: impl Into<String>) -> &Page {
        let order = self.doc.pages.len() as u32 + 1;
        let page = Page::new(order, source_image);
        let key = page.key;
        log::info!("Adding {} ({})", page.name, page.source_image);
        self.doc.pages.push(page);
        self.doc.selected_page_key = Some(key);
        self.emit(StoreEvent::PageAdded(key));
        self.emit(StoreEvent::PageSelected(Some(key)));
        let idx = self.doc.pages.len() - 1;
        &self.doc.pages[idx]
    }

    pub fn update_page(&mut self, key: PageKey, patch: PagePatch) -> Result<(), StoreError> {
        self.edit_page(key, |page| patch.apply(page))
    }

    /// Mutates one page in place. The page key survives whatever `f` does.
    pub fn edit_page<R>(
        &mut self,
        key: PageKey,
        f: impl FnOnce(&mut Page) -> R,
    ) -> Result<R, StoreError> {
        let page = self
            .doc
            .pages
            .iter_mut()
            .find(|p| p.key == key)
            .ok_or(StoreError::PageNotFound(key))?;
        let out = f(page);
        page.key = key;
        self.emit(StoreEvent::PageUpdated(key));
        Ok(out)
    }

    pub fn delete_page(&mut self, key: PageKey) -> Result<(), StoreError> {
        let idx = self
            .doc
            .pages
            .iter()
            .position(|p| p.key == key)
            .ok_or(StoreError::PageNotFound(key))?;
        if self.doc.pages.len() <= 1 {
            log::warn!("Refusing to delete the only page");
            return Err(StoreError::LastPage);
        }
        let removed = self.doc.pages.remove(idx);
        log::info!("Deleted {}", removed.name);
        for (i, page) in self.doc.pages.iter_mut().enumerate() {
            let order = i as u32 + 1;
            page.order = order;
            page.name = page_name(order);
        }
        self.emit(StoreEvent::PageDeleted(key));
        if self.doc.selected_page_key == Some(key) {
            self.doc.selected_page_key = self.doc.pages.first().map(|p| p.key);
            let selected = self.doc.selected_page_key;
            self.emit(StoreEvent::PageSelected(selected));
        }
        Ok(())
    }

    pub fn select_page(&mut self, key: PageKey) -> Result<(), StoreError> {
        if self.doc.page(key).is_none() {
            return Err(StoreError::PageNotFound(key));
        }
        self.doc.selected_page_key = Some(key);
        self.emit(StoreEvent::PageSelected(Some(key)));
        Ok(())
    }
}
