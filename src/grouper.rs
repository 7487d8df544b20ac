//! Stage 2: run-length-compress labeled lines into text runs and
//! `(source-run, want-run)` pairs, preserving order.

use crate::model::{Group, LabeledLine, LineKind};

pub fn group(lines: &[LabeledLine]) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        match lines[i].kind {
            LineKind::Text => {
                let start = i;
                while i < lines.len() && lines[i].kind == LineKind::Text {
                    i += 1;
                }
                groups.push(Group::Text(lines[start..i].iter().map(|l| l.raw.clone()).collect()));
            }
            LineKind::Src => {
                let src_start = i;
                while i < lines.len() && lines[i].kind == LineKind::Src {
                    i += 1;
                }
                let src: Vec<String> = lines[src_start..i].iter().map(|l| l.raw.clone()).collect();

                let want_start = i;
                while i < lines.len() && lines[i].kind == LineKind::Want {
                    i += 1;
                }
                let want: Vec<String> = lines[want_start..i].iter().map(|l| l.raw.clone()).collect();

                groups.push(Group::Block { src, want });
            }
            LineKind::Want => {
                // The labeler never emits a WANT run that isn't preceded by
                // an SRC run in the same iteration, so this arm is
                // unreachable in practice; treat it defensively as an empty
                // source block rather than panicking.
                let want_start = i;
                while i < lines.len() && lines[i].kind == LineKind::Want {
                    i += 1;
                }
                let want: Vec<String> = lines[want_start..i].iter().map(|l| l.raw.clone()).collect();
                groups.push(Group::Block { src: Vec::new(), want });
            }
        }
    }

    groups
}
