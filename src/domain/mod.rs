// Record tree shared by the degrade, clean and flatten stages

pub mod tag;

pub use tag::Tag;

/// One XML element with its namespace prefix already stripped.
///
/// Children are owned; removing a field means filtering it out of its
/// parent's `children`, so no element ever points back at its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Local name, without namespace
    pub name: String,
    /// Namespace URI the element was declared in, if any
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    /// Raw character data for leaves; `None` when the element carried none
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Leaf element carrying `text`
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.text = Some(text.into());
        element
    }

    /// Sibling created next to `self`, in the same namespace
    pub fn sibling(&self, name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::with_text(name, text);
        element.namespace = self.namespace.clone();
        element
    }

    pub fn tag(&self) -> Tag {
        Tag::from_local_name(&self.name)
    }

    pub fn is(&self, tag: &Tag) -> bool {
        self.name == tag.as_str()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First direct child with the given tag
    pub fn child(&self, tag: &Tag) -> Option<&Element> {
        self.children.iter().find(|c| c.is(tag))
    }

    pub fn child_mut(&mut self, tag: &Tag) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.is(tag))
    }

    /// Every descendant (not `self`) with the given tag, in document order
    pub fn descendants<'a>(&'a self, tag: &Tag) -> Vec<&'a Element> {
        let mut found = Vec::new();
        for child in &self.children {
            child.collect_self_and_descendants(tag, &mut found);
        }
        found
    }

    fn collect_self_and_descendants<'a>(&'a self, tag: &Tag, found: &mut Vec<&'a Element>) {
        if self.is(tag) {
            found.push(self);
        }
        for child in &self.children {
            child.collect_self_and_descendants(tag, found);
        }
    }

    /// Every descendant with the given tag paired with its direct parent,
    /// in document order
    pub fn descendants_with_parent<'a>(&'a self, tag: &Tag) -> Vec<(&'a Element, &'a Element)> {
        let mut found = Vec::new();
        self.collect_with_parent(tag, &mut found);
        found
    }

    fn collect_with_parent<'a>(&'a self, tag: &Tag, found: &mut Vec<(&'a Element, &'a Element)>) {
        for child in &self.children {
            if child.is(tag) {
                found.push((self, child));
            }
            child.collect_with_parent(tag, found);
        }
    }

    /// Trimmed texts of every descendant with the given tag, joined by
    /// commas with all spaces removed
    pub fn joined_descendant_text(&self, tag: &Tag) -> String {
        self.descendants(tag)
            .iter()
            .filter_map(|e| e.text.as_deref())
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(",")
            .replace(' ', "")
    }
}

/// A parsed CIN Census document
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTree {
    /// File name the tree was read from, used in reports
    pub name: String,
    pub root: Element,
}

impl RecordTree {
    pub fn new(name: impl Into<String>, root: Element) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// The `Children` collection, either the root itself or a direct child of it
    pub fn children(&self) -> Option<&Element> {
        if self.root.is(&Tag::Children) {
            Some(&self.root)
        } else {
            self.root.child(&Tag::Children)
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Element> {
        if self.root.is(&Tag::Children) {
            Some(&mut self.root)
        } else {
            self.root.child_mut(&Tag::Children)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        let mut assessments = Element::new("Assessments");
        assessments.push(Element::with_text("AssessmentActualStartDate", "2020-01-01"));
        let mut factors = Element::new("FactorsIdentifiedAtAssessment");
        factors.push(Element::with_text("AssessmentFactors", " 1A "));
        factors.push(Element::with_text("AssessmentFactors", "2 B"));
        assessments.push(factors);

        let mut details = Element::new("CINdetails");
        details.push(Element::with_text("CINreferralDate", "2019-12-01"));
        details.push(assessments);
        details
    }

    #[test]
    fn test_descendants_excludes_self_and_keeps_document_order() {
        let details = sample();
        let found = details.descendants(&Tag::AssessmentFactors);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text.as_deref(), Some(" 1A "));
        assert!(details.descendants(&Tag::CinDetails).is_empty());
    }

    #[test]
    fn test_descendants_with_parent_reports_direct_parent() {
        let details = sample();
        let found = details.descendants_with_parent(&Tag::AssessmentActualStartDate);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.tag(), Tag::Assessments);
        assert_eq!(found[0].1.text.as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn test_joined_descendant_text_strips_spaces() {
        let details = sample();
        assert_eq!(details.joined_descendant_text(&Tag::AssessmentFactors), "1A,2B");
    }

    #[test]
    fn test_children_accepts_root_or_direct_child() {
        let mut message = Element::new("Message");
        message.push(Element::new("Header"));
        message.push(Element::new("Children"));
        let tree = RecordTree::new("a.xml", message);
        assert!(tree.children().is_some());

        let tree = RecordTree::new("b.xml", Element::new("Children"));
        assert!(tree.children().is_some());

        let tree = RecordTree::new("c.xml", Element::new("Message"));
        assert!(tree.children().is_none());
    }
}
