//! Metadata cache and mapper under concurrent use.

mod common;

use std::sync::Barrier;
use std::thread;

use common::{Company, Role};
use nebula_mapper::prelude::*;
use nebula_mapper::{enum_type, record_type};

#[derive(Debug, Clone, Default, PartialEq)]
struct Fresh {
    label: String,
    count: u32,
}

impl Record for Fresh {
    fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
        builder
            .default_constructor()
            .field("label", |f| &f.label, |f| &mut f.label)
            .field("count", |f| &f.count, |f| &mut f.count)
    }
}

impl_typed_record!(Fresh);

const THREADS: usize = 8;

#[test]
fn first_describe_races_converge() {
    let barrier = Barrier::new(THREADS);
    let described: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    record_type::<Fresh>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    });

    let first = &described[0];
    assert_eq!(first.readable_names(), vec!["label", "count"]);
    assert!(described.iter().all(|ty| ty == first));
    assert!(described.iter().all(|ty| ty.readable_names() == first.readable_names()));
    assert_eq!(record_type::<Fresh>(), *first);
}

#[test]
fn enum_metadata_is_shared() {
    let types: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS).map(|_| scope.spawn(enum_type::<Role>)).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(types.iter().all(|ty| ty.members() == types[0].members()));
    assert_eq!(types[0].member("admin").map(|m| m.ordinal()), Some(2));
}

#[test]
fn one_mapper_serves_many_threads() {
    let mapper = Mapper::builder()
        .register(ValueType::Text, ValueType::U32, |v| {
            Ok(Value::U32(v.to_string().len() as u32))
        })
        .build();

    thread::scope(|scope| {
        for i in 0..THREADS {
            let mapper = &mapper;
            scope.spawn(move || {
                for _ in 0..50 {
                    let fresh: Fresh = mapper
                        .to(value_map! { "label" => format!("t{i}"), "count" => "abc" })
                        .unwrap();
                    assert_eq!(fresh.count, 3);
                    assert_eq!(fresh.label, format!("t{i}"));

                    let company: Company = mapper
                        .to(value_map! { "name" => "Nike", "since" => i as i64 })
                        .unwrap();
                    assert_eq!(company.since, Some(i as i32));
                }
            });
        }
    });
}
