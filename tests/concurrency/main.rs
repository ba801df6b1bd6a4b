#[path = "../support/mod.rs"]
mod support;

use std::sync::{Arc, Barrier};
use std::thread;

use sourced_uow::bus::InMemoryBus;
use sourced_uow::{LaneId, UnitOfWork};
use support::order::{order, pending, placed};
use support::stores::RecordingStore;

#[test]
fn lanes_on_one_context_are_isolated() {
    let bus = Arc::new(InMemoryBus::new());
    let uow = UnitOfWork::new(RecordingStore::new(), bus.clone());
    let first = uow.lane();
    let second = uow.lane();
    assert_ne!(first.id(), second.id());
    assert_eq!(first.context_id(), second.context_id());

    first.register_new(placed("order-1")).unwrap();
    assert!(second.pending_new().unwrap().is_empty());
    assert!(second.committed().unwrap());
    assert!(!first.committed().unwrap());

    second.register_new(placed("order-2")).unwrap();
    second.commit().unwrap();

    assert_eq!(bus.len(), 1);
    assert_eq!(first.pending_new().unwrap(), vec!["order-1"]);
    assert!(!first.committed().unwrap());
}

#[test]
fn same_aggregate_in_two_lanes() {
    let uow = UnitOfWork::new(RecordingStore::new(), Arc::new(InMemoryBus::new()));
    let first = uow.lane();
    let second = uow.lane();
    let shared = order("order-1");

    first.register_new(shared.clone()).unwrap();
    // No conflict: the other lane never sees the first lane's registration.
    second.register_new(shared).unwrap();
}

#[test]
fn separate_contexts_do_not_share_state() {
    let bus = Arc::new(InMemoryBus::new());
    let left = UnitOfWork::new(RecordingStore::new(), bus.clone());
    let right = UnitOfWork::new(RecordingStore::new(), bus.clone());
    assert_ne!(left.context_id(), right.context_id());

    let lane = LaneId::new();
    left.register_new(lane, placed("order-1")).unwrap();

    assert!(right.pending_new(lane).unwrap().is_empty());
    assert!(right.committed(lane).unwrap());
    assert_eq!(left.pending_new(lane).unwrap(), vec!["order-1"]);

    left.commit(lane).unwrap();
    assert_eq!(left.store().persisted().len(), 1);
    assert!(right.store().persisted().is_empty());
}

#[test]
fn concurrent_lanes_commit_independently() {
    const WORKERS: usize = 8;

    let bus = Arc::new(InMemoryBus::new());
    let uow = UnitOfWork::new(RecordingStore::new(), bus.clone());
    let barrier = Barrier::new(WORKERS);

    thread::scope(|s| {
        for worker in 0..WORKERS {
            let uow = &uow;
            let barrier = &barrier;
            s.spawn(move || {
                let lane = uow.lane();
                let mine = placed(&format!("order-{worker}"));
                lane.register_new(mine.clone()).unwrap();

                // Every lane has registered before anyone looks.
                barrier.wait();
                assert_eq!(lane.pending_new().unwrap(), vec![format!("order-{worker}")]);

                // Odd workers roll back, even workers commit.
                if worker % 2 == 0 {
                    lane.commit().unwrap();
                    assert_eq!(pending(&mine), 0);
                } else {
                    lane.rollback().unwrap();
                    assert_eq!(pending(&mine), 1);
                }
                assert!(lane.committed().unwrap());
            });
        }
    });

    assert_eq!(bus.len(), WORKERS / 2);
    assert_eq!(uow.store().persisted().len(), WORKERS / 2);
    assert_eq!(uow.store().rolled_back().len(), WORKERS / 2);
    for seen in uow.store().persisted() {
        assert_eq!(seen.created.len(), 1);
    }
    assert_eq!(uow.active_lanes().unwrap(), 0);
}

#[test]
fn dropping_a_lane_releases_its_storage() {
    let uow = UnitOfWork::new(RecordingStore::new(), Arc::new(InMemoryBus::new()));
    {
        let lane = uow.lane();
        lane.register_new(order("order-1")).unwrap();
        assert_eq!(uow.active_lanes().unwrap(), 1);
    }
    assert_eq!(uow.active_lanes().unwrap(), 0);
}

#[test]
fn release_and_dispose_are_idempotent() {
    let uow = UnitOfWork::new(RecordingStore::new(), Arc::new(InMemoryBus::new()));
    let a = LaneId::new();
    let b = LaneId::new();

    uow.register_new(a, order("order-1")).unwrap();
    uow.register_new(b, order("order-2")).unwrap();
    assert_eq!(uow.active_lanes().unwrap(), 2);

    uow.release(a).unwrap();
    uow.release(a).unwrap();
    assert_eq!(uow.active_lanes().unwrap(), 1);
    // A released lane starts over.
    assert!(uow.committed(a).unwrap());
    assert!(uow.pending_new(a).unwrap().is_empty());

    uow.dispose().unwrap();
    uow.dispose().unwrap();
    assert_eq!(uow.active_lanes().unwrap(), 0);
}

#[test]
fn reads_do_not_open_a_lane() {
    let uow = UnitOfWork::new(RecordingStore::new(), Arc::new(InMemoryBus::new()));
    let lane = LaneId::new();

    assert!(uow.committed(lane).unwrap());
    assert!(uow.pending_deleted(lane).unwrap().is_empty());
    assert_eq!(uow.active_lanes().unwrap(), 0);
}

#[test]
fn operations_on_an_unknown_lane_do_not_open_it() {
    let bus = Arc::new(InMemoryBus::new());
    let uow = UnitOfWork::new(RecordingStore::new(), bus.clone());
    let lane = LaneId::new();

    let receipt = uow.commit(lane).unwrap();
    assert_eq!(receipt.events_published, 0);
    uow.clear_registrations(lane).unwrap();
    uow.rollback(lane).unwrap();

    assert_eq!(uow.active_lanes().unwrap(), 0);
    assert!(uow.committed(lane).unwrap());
    assert_eq!(uow.store().persisted().len(), 1);
    assert_eq!(uow.store().rolled_back().len(), 1);
    assert!(bus.is_empty());
}

#[test]
fn dropping_the_context_releases_open_lanes() {
    let store = Arc::new(RecordingStore::new());
    let aggregate = placed("order-1");
    {
        let uow = UnitOfWork::new(store.clone(), Arc::new(InMemoryBus::new()));
        uow.register_new(LaneId::new(), aggregate.clone()).unwrap();
        assert_eq!(uow.active_lanes().unwrap(), 1);
    }
    // The lane held the only other handle to the aggregate.
    assert_eq!(Arc::strong_count(&aggregate), 1);
}
