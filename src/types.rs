use rustc_hash::FxHashSet;

pub type HashSet<K> = FxHashSet<K>;
