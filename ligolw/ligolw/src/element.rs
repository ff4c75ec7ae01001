//! The element tree.
//!
//! Unlike a general purpose DOM, attributes are stored on the element itself
//! and only the element kinds of the LIGO_LW DTD are representable. Each
//! kind knows which attributes and children it accepts, and structural edits
//! are checked against those rules.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    #[error("{tag} does not have attribute {attribute}")]
    UnknownAttribute { tag: &'static str, attribute: String },
    #[error("invalid child {child} for {parent}")]
    InvalidChild {
        parent: &'static str,
        child: &'static str,
    },
    #[error("{0}")]
    Ordering(&'static str),
    #[error("invalid value {value} for {tag} attribute Type")]
    InvalidType { tag: &'static str, value: String },
    #[error("unknown element tag {0}")]
    UnknownTag(String),
    #[error("child index {index} out of range for {parent}")]
    NoSuchChild { parent: &'static str, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Document,
    LigoLw,
    Comment,
    Param,
    Table,
    Column,
    Array,
    Dim,
    Stream,
    IgwdFrame,
    Detector,
    AdcData,
    AdcInterval,
    Time,
}

use ElementKind::*;

const ALL_KINDS: &[ElementKind] = &[
    Document,
    LigoLw,
    Comment,
    Param,
    Table,
    Column,
    Array,
    Dim,
    Stream,
    IgwdFrame,
    Detector,
    AdcData,
    AdcInterval,
    Time,
];

impl ElementKind {
    pub fn tag_name(&self) -> &'static str {
        match self {
            Document => "Document",
            LigoLw => "LIGO_LW",
            Comment => "Comment",
            Param => "Param",
            Table => "Table",
            Column => "Column",
            Array => "Array",
            Dim => "Dim",
            Stream => "Stream",
            IgwdFrame => "IGWDFrame",
            Detector => "Detector",
            AdcData => "AdcData",
            AdcInterval => "AdcInterval",
            Time => "Time",
        }
    }

    /// Look up a kind by its (case sensitive) tag name.
    ///
    /// `Document` is not a real tag and is never returned.
    pub fn from_tag_name(tag: &str) -> Option<Self> {
        ALL_KINDS
            .iter()
            .copied()
            .filter(|k| *k != Document)
            .find(|k| k.tag_name() == tag)
    }

    pub fn valid_children(&self) -> &'static [ElementKind] {
        match self {
            Document => &[LigoLw],
            LigoLw => &[
                LigoLw,
                Comment,
                Param,
                Table,
                Array,
                Stream,
                IgwdFrame,
                AdcData,
                AdcInterval,
                Time,
                Detector,
            ],
            Param => &[Comment],
            Table => &[Comment, Column, Stream],
            Array => &[Dim, Stream],
            IgwdFrame => &[
                Comment, Param, Time, Detector, AdcData, LigoLw, Stream, Array, IgwdFrame,
            ],
            Detector => &[Comment, Param, LigoLw],
            AdcData => &[AdcData, Comment, Param, Time, LigoLw, Array],
            AdcInterval => &[AdcData, Comment, Time],
            Comment | Column | Dim | Stream | Time => &[],
        }
    }

    pub fn valid_attributes(&self) -> &'static [&'static str] {
        match self {
            Document | Comment => &[],
            LigoLw => &["Name", "Type"],
            Param => &["Name", "Type", "Start", "Scale", "Unit", "DataUnit"],
            Table => &["Name", "Type"],
            Column => &["Name", "Type", "Unit"],
            Array => &["Name", "Type", "Unit"],
            Dim => &["Name", "Unit", "Start", "Scale"],
            Stream => &["Name", "Type", "Delimiter", "Encoding", "Content"],
            IgwdFrame | Detector | AdcData => &["Name"],
            AdcInterval => &["Name", "StartTime", "DeltaT"],
            Time => &["Name", "Type"],
        }
    }

    /// Character data is kept for these kinds and discarded for the rest.
    pub(crate) fn keeps_text(&self) -> bool {
        matches!(self, Comment | Stream | Param | Time | Dim)
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    kind: ElementKind,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    pcdata: Option<String>,
}

impl Element {
    /// Create an element with no attributes other than the defaults of its
    /// kind.
    pub fn new(kind: ElementKind) -> Self {
        let mut el = Self {
            kind,
            attributes: Vec::new(),
            children: Vec::new(),
            pcdata: None,
        };
        el.apply_defaults();
        el
    }

    /// Create an element, rejecting attributes its kind does not accept.
    pub fn with_attributes<I, K, V>(kind: ElementKind, attrs: I) -> Result<Self, ElementError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut el = Self {
            kind,
            attributes: Vec::new(),
            children: Vec::new(),
            pcdata: None,
        };
        for (k, v) in attrs {
            el.insert_attribute(k.into(), v.into())?;
        }
        el.apply_defaults();
        el.check_type_attribute()?;
        Ok(el)
    }

    fn apply_defaults(&mut self) {
        let defaults: &[(&str, &str)] = match self.kind {
            Stream => &[("Type", "Local"), ("Delimiter", ",")],
            Time => &[("Type", "ISO-8601")],
            _ => &[],
        };
        for (k, v) in defaults {
            if self.get_attribute(k).is_none() {
                self.attributes.push((k.to_string(), v.to_string()));
            }
        }
    }

    fn check_type_attribute(&self) -> Result<(), ElementError> {
        let allowed: &[&str] = match self.kind {
            Stream => &["Remote", "Local"],
            Time => &["GPS", "Unix", "ISO-8601"],
            _ => return Ok(()),
        };
        let value = self.get_attribute("Type").unwrap_or_default();
        if allowed.contains(&value) {
            Ok(())
        } else {
            Err(ElementError::InvalidType {
                tag: self.kind.tag_name(),
                value: value.to_string(),
            })
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn tag_name(&self) -> &'static str {
        self.kind.tag_name()
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Element] {
        &mut self.children
    }

    pub fn pcdata(&self) -> Option<&str> {
        self.pcdata.as_deref()
    }

    pub fn set_pcdata(&mut self, data: Option<String>) {
        self.pcdata = data;
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute<K, V>(&mut self, name: K, value: V) -> Result<(), ElementError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let is_type = name == "Type";
        let previous = self.insert_attribute(name, value.into())?;
        if is_type {
            if let Err(e) = self.check_type_attribute() {
                match previous {
                    Some(v) => {
                        self.insert_attribute("Type".into(), v)?;
                    }
                    None => self.attributes.retain(|(k, _)| k != "Type"),
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Store an attribute without checking its value, returning the value it
    /// replaced.
    fn insert_attribute(
        &mut self,
        name: String,
        value: String,
    ) -> Result<Option<String>, ElementError> {
        if !self.kind.valid_attributes().contains(&name.as_str()) {
            return Err(ElementError::UnknownAttribute {
                tag: self.kind.tag_name(),
                attribute: name,
            });
        }
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => Ok(Some(std::mem::replace(&mut slot.1, value))),
            None => {
                self.attributes.push((name, value));
                Ok(None)
            }
        }
    }

    /// Add characters to the element's character data.
    pub fn append_data(&mut self, content: &str) {
        match &mut self.pcdata {
            Some(pcdata) => pcdata.push_str(content),
            None => self.pcdata = Some(content.to_string()),
        }
    }

    /// Add a child, returning a reference to it in its new place.
    pub fn append_child(&mut self, child: Element) -> Result<&mut Element, ElementError> {
        let index = self.children.len();
        self.insert_child(index, child)
    }

    /// Insert a child before the child currently at `index`.
    pub fn insert_child(
        &mut self,
        index: usize,
        child: Element,
    ) -> Result<&mut Element, ElementError> {
        if index > self.children.len() {
            return Err(ElementError::NoSuchChild {
                parent: self.kind.tag_name(),
                index,
            });
        }
        self.check_child_kind(child.kind)?;
        self.children.insert(index, child);
        if let Err(e) = self.verify_children() {
            self.children.remove(index);
            return Err(e);
        }
        Ok(&mut self.children[index])
    }

    pub fn remove_child(&mut self, index: usize) -> Result<Element, ElementError> {
        if index >= self.children.len() {
            return Err(ElementError::NoSuchChild {
                parent: self.kind.tag_name(),
                index,
            });
        }
        Ok(self.children.remove(index))
    }

    /// Replace the child at `index`, returning the old one.
    pub fn replace_child(&mut self, index: usize, child: Element) -> Result<Element, ElementError> {
        if index >= self.children.len() {
            return Err(ElementError::NoSuchChild {
                parent: self.kind.tag_name(),
                index,
            });
        }
        self.check_child_kind(child.kind)?;
        let old = std::mem::replace(&mut self.children[index], child);
        if let Err(e) = self.verify_children() {
            self.children[index] = old;
            return Err(e);
        }
        Ok(old)
    }

    fn check_child_kind(&self, child: ElementKind) -> Result<(), ElementError> {
        if self.kind.valid_children().contains(&child) {
            Ok(())
        } else {
            Err(ElementError::InvalidChild {
                parent: self.kind.tag_name(),
                child: child.tag_name(),
            })
        }
    }

    fn verify_children(&self) -> Result<(), ElementError> {
        match self.kind {
            Table => {
                let (mut ncomment, mut ncolumn, mut nstream) = (0, 0, 0);
                for child in self.children.iter() {
                    match child.kind {
                        Comment => {
                            if ncomment > 0 {
                                return Err(ElementError::Ordering(
                                    "only one Comment allowed in Table",
                                ));
                            }
                            if ncolumn > 0 || nstream > 0 {
                                return Err(ElementError::Ordering(
                                    "Comment must come before Column(s) and Stream in Table",
                                ));
                            }
                            ncomment += 1;
                        }
                        Column => {
                            if nstream > 0 {
                                return Err(ElementError::Ordering(
                                    "Column(s) must come before Stream in Table",
                                ));
                            }
                            ncolumn += 1;
                        }
                        _ => {
                            if nstream > 0 {
                                return Err(ElementError::Ordering(
                                    "only one Stream allowed in Table",
                                ));
                            }
                            nstream += 1;
                        }
                    }
                }
            }
            Array => {
                let mut nstream = 0;
                for child in self.children.iter() {
                    if child.kind == Dim {
                        if nstream > 0 {
                            return Err(ElementError::Ordering(
                                "Dim(s) must come before Stream in Array",
                            ));
                        }
                    } else {
                        if nstream > 0 {
                            return Err(ElementError::Ordering("only one Stream allowed in Array"));
                        }
                        nstream += 1;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// All elements at or below this one for which `filter` returns true.
    ///
    /// Descendants are listed depth first, before the element itself.
    pub fn get_elements<F>(&self, filter: &F) -> Vec<&Element>
    where
        F: Fn(&Element) -> bool,
    {
        let mut out = Vec::new();
        for child in self.children.iter() {
            out.extend(child.get_elements(filter));
        }
        if filter(self) {
            out.push(self);
        }
        out
    }

    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<&Element> {
        self.get_elements(&|e: &Element| e.tag_name() == tag)
    }

    /// Direct children whose attributes include every `(name, value)` pair.
    pub fn get_children_by_attributes(&self, attrs: &[(&str, &str)]) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|c| {
                attrs
                    .iter()
                    .all(|(k, v)| c.get_attribute(k) == Some(*v))
            })
            .collect()
    }
}
