/// Picks the slot identifier for a new schedule entry.
///
/// Device slot ids are small dense integers that get reused after deletion,
/// so this fills the first hole in `0,1,2,…` before growing past the current
/// maximum. An empty schedule starts at 0.
pub fn next_id(used: &[u32]) -> u32 {
    let mut sorted = used.to_vec();
    sorted.sort_unstable();
    for (index, id) in sorted.iter().enumerate() {
        if *id != index as u32 {
            return index as u32;
        }
    }
    sorted.len() as u32
}
