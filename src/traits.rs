/// Merges the content of another instance into `self`.
pub trait Merge {
    fn merge(&mut self, other: Self);
}
