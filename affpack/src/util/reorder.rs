/// Performs a single bubble pass from the back of `slice` towards its front.
/// Afterwards the element `precedes` prefers above all others sits at index 0.
/// When only one element moved forward in an otherwise sorted slice, the slice is sorted again.
pub fn bubble_up<T: Copy>(slice: &mut [T], mut precedes: impl FnMut(T, T) -> bool) {
    for i in (1..slice.len()).rev() {
        if precedes(slice[i], slice[i - 1]) {
            slice.swap(i, i - 1);
        }
    }
}
