//! Conflict detection across the advertisers of one prefix

use crate::state::PrefixEntries;

/// Whether the advertisers of one prefix disagree on how to forward it
///
/// Two advertisers conflict when their forwarding algorithm or forwarding
/// type differ. Such a prefix cannot be merged into a single forwarding
/// decision. An empty advertiser set is not a conflict.
pub fn has_conflicting_forwarding_info(entries: &PrefixEntries) -> bool {
    let mut infos = entries.values().map(|entry| entry.forwarding_info());

    let Some(first) = infos.next() else {
        return false;
    };

    infos.any(|info| info != first)
}
