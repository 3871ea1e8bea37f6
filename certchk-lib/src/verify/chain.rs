//! Certificate path building.
//!
//! Given a subject certificate, the trust store and a pool of untrusted
//! intermediates, finds a path that terminates at a trust anchor using an
//! iterative depth-first search with backtracking. All working state
//! (arena, frame stack, link cache) belongs to one call.

use log::{debug, trace};

use super::checks::structural_defects;
use super::flags::VerifyFlags;
use super::signature::LinkVerifier;
use super::TrustStore;
use crate::record::CertificateRecord;

/// Default maximum number of certificates on one path.
pub(crate) const MAX_CHAIN_DEPTH: usize = 32;

/// Upper bound on candidate links examined by one search. Pools full of
/// cross-signed duplicates can otherwise blow up combinatorially.
const MAX_SEARCH_STEPS: usize = 100_000;

/// One certificate on a path, with whether it was taken from the trust store.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PathCert<'a> {
    pub cert: &'a CertificateRecord,
    pub anchor: bool,
}

/// Outcome of path building.
#[derive(Debug)]
pub(crate) struct BuiltChain<'a> {
    /// Subject first.
    pub path: Vec<PathCert<'a>>,
    /// Whether the topmost certificate is a trust anchor.
    pub trusted: bool,
    /// Flags owed by the topmost certificate because of how the search ended.
    pub top_flags: VerifyFlags,
}

/// Candidate pool for one call: index 0 is the subject, then the trust
/// anchors in store order, then the intermediates in caller order.
struct Arena<'a> {
    nodes: Vec<PathCert<'a>>,
    store: &'a TrustStore,
    first_intermediate: usize,
}

impl<'a> Arena<'a> {
    fn new(
        subject: &'a CertificateRecord,
        intermediates: &'a [CertificateRecord],
        store: &'a TrustStore,
    ) -> Self {
        let mut nodes = Vec::with_capacity(1 + store.len() + intermediates.len());
        nodes.push(PathCert {
            cert: subject,
            anchor: store.contains(subject),
        });
        nodes.extend(store.iter().map(|cert| PathCert { cert, anchor: true }));
        let first_intermediate = nodes.len();
        nodes.extend(
            intermediates
                .iter()
                .map(|cert| PathCert { cert, anchor: false }),
        );
        Arena {
            nodes,
            store,
            first_intermediate,
        }
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, idx: usize) -> Option<PathCert<'a>> {
        self.nodes.get(idx).copied()
    }

    /// Possible issuers of `child`: anchors first, then intermediates.
    fn candidates_for(&self, child: usize) -> Vec<usize> {
        let Some(child) = self.node(child) else {
            return Vec::new();
        };
        let issuer = child.cert.issuer.raw.as_slice();
        let anchors = self.store.indices_by_subject(issuer).iter().map(|i| i + 1);
        let intermediates = (self.first_intermediate..self.nodes.len()).filter(|&i| {
            self.nodes
                .get(i)
                .is_some_and(|n| n.cert.subject.raw.as_slice() == issuer)
        });
        anchors.chain(intermediates).collect()
    }

    fn resolve(&self, path: &[usize]) -> Vec<PathCert<'a>> {
        path.iter().filter_map(|&i| self.node(i)).collect()
    }
}

struct Frame {
    node: usize,
    candidates: Vec<usize>,
    next: usize,
}

/// Build the best path for `subject`.
///
/// The first trusted path without structural defects wins. Failing that,
/// the first trusted path found is returned so its defects are reported.
/// Failing that, the longest partial path explored is returned with
/// [`VerifyFlags::NOT_TRUSTED`] on its topmost certificate.
pub(crate) fn build_chain<'a>(
    subject: &'a CertificateRecord,
    intermediates: &'a [CertificateRecord],
    store: &'a TrustStore,
    links: &mut LinkVerifier<'_>,
    max_depth: usize,
) -> BuiltChain<'a> {
    let arena = Arena::new(subject, intermediates, store);

    if arena.node(0).is_some_and(|n| n.anchor) {
        let mut top_flags = VerifyFlags::empty();
        if subject.is_self_issued() && !links.verify(0, subject, 0, subject) {
            top_flags |= VerifyFlags::BAD_SIGNATURE;
        }
        debug!("'{}' is itself a trust anchor", subject.short_name());
        return BuiltChain {
            path: arena.resolve(&[0]),
            trusted: true,
            top_flags,
        };
    }

    let mut path: Vec<usize> = vec![0];
    let mut stack = vec![Frame {
        node: 0,
        candidates: arena.candidates_for(0),
        next: 0,
    }];
    let mut best_partial: Vec<usize> = vec![0];
    let mut first_trusted: Option<Vec<usize>> = None;
    let mut rejected_by_signature = vec![false; arena.len()];
    let mut steps = 0usize;

    loop {
        let Some(frame) = stack.last_mut() else {
            break;
        };
        let child = frame.node;
        let next = frame.candidates.get(frame.next).copied();
        frame.next += 1;

        let Some(candidate) = next else {
            stack.pop();
            path.pop();
            continue;
        };

        steps += 1;
        if steps > MAX_SEARCH_STEPS {
            debug!("path search for '{}' stopped after {} steps", subject.short_name(), MAX_SEARCH_STEPS);
            break;
        }

        let (Some(child_node), Some(parent)) = (arena.node(child), arena.node(candidate)) else {
            continue;
        };

        if path
            .iter()
            .filter_map(|&i| arena.node(i))
            .any(|n| n.cert.raw == parent.cert.raw)
        {
            trace!("skipping '{}': already on the path", parent.cert.short_name());
            continue;
        }
        if path.len() >= max_depth {
            trace!("skipping '{}': depth limit {}", parent.cert.short_name(), max_depth);
            continue;
        }
        if !links.verify(child, child_node.cert, candidate, parent.cert) {
            if let Some(flag) = rejected_by_signature.get_mut(child) {
                *flag = true;
            }
            continue;
        }

        path.push(candidate);

        if parent.anchor {
            let resolved = arena.resolve(&path);
            let defects = structural_defects(&resolved);
            if defects.is_empty() {
                debug!(
                    "trusted path of length {} for '{}'",
                    resolved.len(),
                    subject.short_name()
                );
                return BuiltChain {
                    path: resolved,
                    trusted: true,
                    top_flags: VerifyFlags::empty(),
                };
            }
            trace!("trusted path with structural defects {}, continuing search", defects);
            if first_trusted.is_none() {
                first_trusted = Some(path.clone());
            }
            path.pop();
            continue;
        }

        if path.len() > best_partial.len() {
            best_partial = path.clone();
        }
        stack.push(Frame {
            node: candidate,
            candidates: arena.candidates_for(candidate),
            next: 0,
        });
    }

    if let Some(trusted) = first_trusted {
        debug!(
            "only structurally defective trusted paths for '{}', using the first",
            subject.short_name()
        );
        return BuiltChain {
            path: arena.resolve(&trusted),
            trusted: true,
            top_flags: VerifyFlags::empty(),
        };
    }

    let mut top_flags = VerifyFlags::NOT_TRUSTED;
    if let Some(&top) = best_partial.last() {
        top_flags.set_if(
            rejected_by_signature.get(top).copied().unwrap_or(false),
            VerifyFlags::BAD_SIGNATURE,
        );
    }
    debug!(
        "no trusted path for '{}', best partial path has length {}",
        subject.short_name(),
        best_partial.len()
    );
    BuiltChain {
        path: arena.resolve(&best_partial),
        trusted: false,
        top_flags,
    }
}
