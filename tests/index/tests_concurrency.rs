//! Concurrent reindexing and lookup
//!
//! A reader must observe either every stub of a file's old content or every
//! stub of its new content, never a mixture, and a late result for an older
//! version must never replace a newer one.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use perl5::FileId;
use perl5::index::{FileText, IndexError};
use perl5::stubs::IndexKey;

use crate::helpers::stub_helpers::new_indexer;

const OLD: &str = "my $old_a; my $old_b; my $old_c; my $old_d;";
const NEW: &str = "my $new_a; my $new_b; my $new_c; my $new_d;";

#[test]
fn test_readers_see_whole_file_sets() {
    let indexer = new_indexer();
    let file = FileId::new(1);
    indexer.index_text(file, 0, OLD).unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        scope.spawn(|| {
            for version in 1..200u64 {
                let text = if version % 2 == 0 { OLD } else { NEW };
                indexer.index_text(file, version, text).unwrap();
            }
            done.store(true, Ordering::Release);
        });

        for _ in 0..2 {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let set = indexer.index().file_stubs(file).unwrap();
                    let prefixes: Vec<_> = set
                        .stubs()
                        .iter()
                        .map(|stub| stub.name.split('_').next().unwrap().to_string())
                        .collect();
                    assert_eq!(prefixes.len(), 4);
                    assert!(
                        prefixes.iter().all(|p| p == &prefixes[0]),
                        "mixed stub set: {:?}",
                        prefixes
                    );
                }
            });
        }
    });

    assert_eq!(indexer.index().committed_version(file), Some(199));
    assert_eq!(indexer.index().lookup(IndexKey::SCALAR, "new_a").unwrap().len(), 1);
    assert!(indexer.index().lookup(IndexKey::SCALAR, "old_a").unwrap().is_empty());
}

#[test]
fn test_unrelated_files_index_concurrently() {
    let indexer = new_indexer();
    let sources: Vec<String> =
        (0..32).map(|i| format!("our $var_{i}; sub sub_{i} {{ }}")).collect();
    let files: Vec<FileText<'_>> = sources
        .iter()
        .enumerate()
        .map(|(i, text)| FileText::new(FileId::new(i as u32), 1, text))
        .collect();

    let results = indexer.index_files(&files);
    assert_eq!(results.len(), 32);
    for (file, result) in &results {
        assert_eq!(result.as_ref().unwrap().file, *file);
        assert_eq!(result.as_ref().unwrap().stubs, 2);
    }
    for i in 0..32 {
        let found = indexer
            .index()
            .lookup(IndexKey::SCALAR, &format!("var_{i}"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file, FileId::new(i));
    }
}

#[test]
fn test_late_older_result_is_discarded() {
    let indexer = new_indexer();
    let file = FileId::new(9);
    let files = [
        FileText::new(file, 2, "my $newer;"),
        FileText::new(FileId::new(10), 1, "my $other;"),
    ];
    indexer.index_files(&files);

    let late = indexer.index_text(file, 1, "my $older;");
    assert!(matches!(late, Err(IndexError::Superseded { version: 1, committed: 2, .. })));
    assert_eq!(indexer.index().lookup(IndexKey::SCALAR, "newer").unwrap().len(), 1);
    assert!(indexer.index().lookup(IndexKey::SCALAR, "older").unwrap().is_empty());
}
