//! Split of the cpu budget between concurrent invocations of the aligner.
//!
//! Each phase runs at most `total_cpus` tasks at once, and each task gets a number of
//! threads for its own invocation. When there are more tasks than cpus we run many
//! single threaded invocations, otherwise the budget is shared evenly.

/// number of threads each invocation of a phase with `nb_items` tasks may use.
/// Always at least 1.
pub fn allocate_cpus(total_cpus: usize, nb_items: usize) -> usize {
    // nothing is dispatched in this case
    if nb_items == 0 {
        return total_cpus.max(1);
    }
    if total_cpus <= nb_items {
        1
    } else {
        (total_cpus / nb_items).max(1)
    }
} // end of allocate_cpus

/// number of workers running tasks of a phase concurrently
pub fn pool_size(total_cpus: usize, nb_items: usize) -> usize {
    total_cpus.min(nb_items).max(1)
}
