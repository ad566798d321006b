use dg_domain::turn::{Speaker, Turn};

/// `history` split into the directives routed to one viewer and the
/// regular participant turns, both in sequence order.
pub struct Partition<'a> {
    pub directives: Vec<&'a Turn>,
    pub regular: Vec<&'a Turn>,
    /// Directives addressed to the other participant. Never forwarded.
    pub foreign_directives: usize,
}

pub fn partition(history: &[Turn], viewer: Speaker) -> Partition<'_> {
    let mut directives = Vec::new();
    let mut regular = Vec::new();
    let mut foreign_directives = 0;

    for turn in history {
        if turn.is_directive() {
            if turn.is_directive_for(viewer) {
                directives.push(turn);
            } else {
                foreign_directives += 1;
            }
        } else {
            regular.push(turn);
        }
    }

    Partition {
        directives,
        regular,
        foreign_directives,
    }
}

/// Keep the most recent `size` regular turns, oldest first. Returns the kept
/// slice and how many were dropped.
pub fn window<'a, 'b>(regular: &'b [&'a Turn], size: usize) -> (&'b [&'a Turn], usize) {
    let dropped = regular.len().saturating_sub(size);
    (&regular[dropped..], dropped)
}

/// Drop every Episode except the latest. Notes pass through untouched and
/// relative order is preserved.
///
/// Returns the surviving directives, the surviving episode (if any) and the
/// number of suppressed episodes.
pub fn suppress_stale_episodes<'a>(
    directives: &[&'a Turn],
) -> (Vec<&'a Turn>, Option<&'a Turn>, usize) {
    let latest = directives
        .iter()
        .filter(|t| t.is_episode())
        .max_by_key(|t| t.sequence)
        .copied();

    let mut suppressed = 0;
    let kept = directives
        .iter()
        .copied()
        .filter(|t| {
            if !t.is_episode() {
                return true;
            }
            let keep = latest.is_some_and(|l| l.sequence == t.sequence);
            if !keep {
                suppressed += 1;
            }
            keep
        })
        .collect();

    (kept, latest, suppressed)
}
