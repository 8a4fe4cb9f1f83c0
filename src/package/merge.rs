//! Folding the documents of a multi-document container into one.

use crate::common::{Error, Result};
use crate::model::{Identified, ReqIfContent, ReqIfDocument};
use log::debug;
use std::collections::HashSet;

/// Merge `documents` into a single logical document.
///
/// Keyed collections are unioned by identifier with the first definition
/// (in input order) kept. Every content section of every input folds into
/// one section. Tool extensions and attachments concatenate. The first header
/// and language tag found are kept.
///
/// A single document is returned unchanged.
///
/// # Errors
///
/// [`Error::NotFound`] when `documents` is empty.
pub fn merge_documents(documents: Vec<ReqIfDocument>) -> Result<ReqIfDocument> {
    if documents.len() <= 1 {
        return documents
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound("No documents to merge".to_string()));
    }

    let count = documents.len();
    let mut merged = ReqIfDocument::default();
    let mut content = ContentMerger::default();
    let mut has_content = false;

    for document in documents {
        if merged.header.is_none() {
            merged.header = document.header;
        }
        if merged.lang.is_none() {
            merged.lang = document.lang;
        }
        merged.tool_extensions.extend(document.tool_extensions);
        for attachment in document.attachments {
            if merged.attachment(&attachment.name).is_none() {
                merged.attachments.push(attachment);
            }
        }
        for section in document.core_content {
            has_content = true;
            content.fold(section);
        }
    }

    debug!(
        "Merged {} documents, dropped {} duplicate definitions",
        count, content.duplicates
    );

    if has_content {
        merged.core_content.push(content.merged);
    }
    Ok(merged)
}

#[derive(Default)]
struct ContentMerger {
    merged: ReqIfContent,
    seen: [HashSet<String>; 6],
    duplicates: usize,
}

impl ContentMerger {
    fn fold(&mut self, section: ReqIfContent) {
        let [datatypes, spec_types, spec_objects, spec_relations, specifications, groups] =
            &mut self.seen;
        let target = &mut self.merged;

        self.duplicates += union_into(&mut target.datatypes, datatypes, section.datatypes);
        self.duplicates += union_into(&mut target.spec_types, spec_types, section.spec_types);
        self.duplicates += union_into(&mut target.spec_objects, spec_objects, section.spec_objects);
        self.duplicates += union_into(
            &mut target.spec_relations,
            spec_relations,
            section.spec_relations,
        );
        self.duplicates += union_into(
            &mut target.specifications,
            specifications,
            section.specifications,
        );
        self.duplicates += union_into(
            &mut target.spec_relation_groups,
            groups,
            section.spec_relation_groups,
        );
    }
}

/// Append the items of `incoming` whose identifier is not yet in `seen`.
/// Returns how many were dropped.
fn union_into<T: Identified>(
    target: &mut Vec<T>,
    seen: &mut HashSet<String>,
    incoming: Vec<T>,
) -> usize {
    let mut dropped = 0;
    for item in incoming {
        if seen.insert(item.identifier().to_string()) {
            target.push(item);
        } else {
            dropped += 1;
        }
    }
    dropped
}
