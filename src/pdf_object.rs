use crate::Error;
use lopdf::{Document, Object, ObjectId};

/// Guards against reference cycles in malformed documents.
const MAX_REFERENCE_DEPTH: usize = 32;

pub trait PdfObjectDeref {
    /// Follow `Reference`s until a direct object is reached.
    fn deref<'a>(&'a self, doc: &'a Document) -> Result<&'a Object, Error>;
}

impl PdfObjectDeref for Object {
    fn deref<'a>(&'a self, doc: &'a Document) -> Result<&'a Object, Error> {
        let mut current = self;
        for _ in 0..MAX_REFERENCE_DEPTH {
            match current {
                Object::Reference(id) => current = doc.get_object(*id)?,
                _ => return Ok(current),
            }
        }
        Err(Error::Other("Reference chain too deep.".to_owned()))
    }
}

/// PDF numbers are either integers or reals; box coordinates use both.
pub fn as_number(object: &Object) -> Result<f64, Error> {
    match object {
        Object::Integer(value) => Ok(*value as f64),
        Object::Real(value) => Ok(*value as f64),
        other => Err(Error::Other(format!(
            "Expected a number, found {:?}.",
            other.type_name().unwrap_or("unknown")
        ))),
    }
}

/// Look up `key` on a page, walking up the `Parent` chain for inheritable attributes.
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<&'a Object, Error> {
    let mut node_id = page_id;
    for _ in 0..MAX_REFERENCE_DEPTH {
        let node = doc.get_object(node_id)?.as_dict()?;
        if node.has(key) {
            return node.get(key)?.deref(doc);
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node_id = *parent_id,
            _ => break,
        }
    }
    Err(Error::Other(format!(
        "Page attribute {} not found.",
        String::from_utf8_lossy(key)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn deref_follows_nested_references() {
        let mut doc = Document::with_version("1.5");
        let number_id = doc.add_object(Object::Integer(42));
        let outer_id = doc.add_object(Object::Reference(number_id));
        let outer = Object::Reference(outer_id);

        let resolved = outer.deref(&doc).unwrap();
        assert_eq!(as_number(resolved).unwrap(), 42.0);
    }

    #[test]
    fn media_box_is_inherited_from_page_tree() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );

        let media_box = inherited_attribute(&doc, page_id, b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap();
        assert_eq!(as_number(&media_box[3]).unwrap(), 792.0);
    }

    #[test]
    fn non_numbers_are_rejected() {
        assert!(as_number(&Object::Name(b"F1".to_vec())).is_err());
    }
}
