use crate::schemas::UserId;

/// Returns the smallest positive id that is not in `existing`.
///
/// The ids are sorted first and zeros are ignored; the scan starts at 1 and
/// stops at the first gap, so `[1, 2, 4]` gives 3 and `[1, 2, 3]` gives 4.
pub fn next_user_id(existing: impl IntoIterator<Item = UserId>) -> UserId {
    let mut ids: Vec<UserId> = existing.into_iter().filter(|id| *id != 0).collect();
    ids.sort_unstable();

    let mut next = 1;
    for id in ids {
        if id == next {
            next += 1;
        } else if id > next {
            break;
        }
    }
    next
}
