//! Process-wide metadata caches.
//!
//! Lookups never take an exclusive lock around a build. Two threads that
//! miss at the same time both describe the type; builds are deterministic,
//! so whichever entry lands first is the one every caller gets back.

use std::any::TypeId;
use std::sync::LazyLock;

use dashmap::DashMap;

use super::{Record, RecordBuilder, RecordType};
use crate::types::{EnumType, Enumeration};

static RECORD_TYPES: LazyLock<DashMap<TypeId, RecordType>> = LazyLock::new(DashMap::new);

static ENUM_TYPES: LazyLock<DashMap<TypeId, EnumType>> = LazyLock::new(DashMap::new);

/// Metadata of record type `T`, described on first use.
pub fn record_type<T: Record>() -> RecordType {
    let key = TypeId::of::<T>();
    if let Some(cached) = RECORD_TYPES.get(&key) {
        return cached.clone();
    }

    // No guard is held here: describing `T` may describe its parent first.
    let built = T::describe(RecordBuilder::new()).build();
    tracing::debug!(
        record = built.name(),
        properties = built.len(),
        parent = built.parent().map(RecordType::name),
        "described record type"
    );
    RECORD_TYPES.entry(key).or_insert(built).clone()
}

/// Descriptor of enumeration `E`, built on first use.
pub fn enum_type<E: Enumeration>() -> EnumType {
    let key = TypeId::of::<E>();
    if let Some(cached) = ENUM_TYPES.get(&key) {
        return cached.clone();
    }

    let built = EnumType::build::<E>();
    tracing::debug!(
        enumeration = built.name(),
        members = built.members().len(),
        "described enum type"
    );
    ENUM_TYPES.entry(key).or_insert(built).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Probe {
        a: i32,
    }

    impl Record for Probe {
        fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
            builder.default_constructor().field("a", |p| &p.a, |p| &mut p.a)
        }
    }

    #[test]
    fn repeated_lookups_share_metadata() {
        let first = record_type::<Probe>();
        let second = record_type::<Probe>();
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first.0, &second.0));
    }

    #[test]
    fn concurrent_lookups_agree() {
        let seen: Vec<RecordType> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(record_type::<Probe>)).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let reference = record_type::<Probe>();
        for ty in seen {
            assert!(Arc::ptr_eq(&ty.0, &reference.0));
            assert_eq!(ty.writable_names(), vec!["a"]);
        }
    }
}
