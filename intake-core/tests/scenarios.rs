// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios exercised against the public API, one per spec.md §8 concrete scenario
//! that isn't already covered at the unit level inside the module it concerns.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use intake_core::consensus::{Consensus, ConsensusRoundOutput, StateSignatureRecorder};
use intake_core::context::Context;
use intake_core::crypto::{CryptoEngine, DefaultCryptoEngine};
use intake_core::dispatcher::{Dispatcher, Task};
use intake_core::error::IntakeError;
use intake_core::event::{Event, EventAPI as _, Round};
use intake_core::intake::{EventIntake, IntakeObserver};
use intake_core::mapper::EventMapper;
use intake_core::quorum::CriticalQuorum;
use intake_core::rules::FreezeManager;
use intake_core::test_support::event_factory::EventFactory;
use intake_core::tracker::TransactionTracker;
use intake_core::transaction::{Transaction, TransactionPool, TransactionSupplier};
use parking_lot::RwLock;
use rand::{rngs::StdRng, SeedableRng as _};

struct StampingConsensus {
    round: Round,
}

impl Consensus for StampingConsensus {
    fn add_event(
        &mut self,
        event: &mut Event,
        _address_book: &intake_config::AddressBook,
    ) -> Result<Vec<ConsensusRoundOutput>, IntakeError> {
        event.set_round_created(self.round);
        Ok(vec![])
    }
    fn min_round(&self) -> Round {
        0
    }
    fn min_generation_non_ancient(&self) -> intake_core::event::Generation {
        0
    }
    fn drain_stale_events(&mut self) -> Vec<Event> {
        vec![]
    }
}

struct OldConsensus;
impl Consensus for OldConsensus {
    fn add_event(
        &mut self,
        event: &mut Event,
        _address_book: &intake_config::AddressBook,
    ) -> Result<Vec<ConsensusRoundOutput>, IntakeError> {
        event.set_round_created(1);
        Ok(vec![])
    }
    fn min_round(&self) -> Round {
        50 // every round-1 event is already "old" against this watermark
    }
    fn min_generation_non_ancient(&self) -> intake_core::event::Generation {
        0
    }
    fn drain_stale_events(&mut self) -> Vec<Event> {
        vec![]
    }
}

struct CountingEventAdded(AtomicUsize);
impl IntakeObserver for CountingEventAdded {
    fn event_added(&self, _event: &Event) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct NoFreeze;
impl FreezeManager for NoFreeze {
    fn is_frozen(&self) -> bool {
        false
    }
}

struct EmptyPool;
impl TransactionPool for EmptyPool {
    fn num_user_trans_for_event(&self) -> usize {
        0
    }
    fn num_freeze_trans_event(&self) -> usize {
        0
    }
}

struct TrackingSupplier {
    drained: Arc<AtomicBool>,
}
impl TransactionSupplier for TrackingSupplier {
    fn drain(&self) -> Vec<Transaction> {
        self.drained.store(true, Ordering::SeqCst);
        vec![]
    }
}

struct NoOpRecorder;
impl StateSignatureRecorder for NoOpRecorder {
    fn record_state_sig(&self, _round: i64, _member_id: intake_config::NodeId, _state_hash: Option<()>, _sig: &[u8]) {}
}

fn dispatcher_with(
    context: Arc<Context>,
    consensus: Box<dyn Consensus>,
    supplier: Arc<dyn TransactionSupplier>,
) -> (Dispatcher, Arc<EventMapper>, Arc<CountingEventAdded>) {
    dispatcher_with_recorder(context, consensus, supplier, Arc::new(NoOpRecorder))
}

fn dispatcher_with_recorder(
    context: Arc<Context>,
    consensus: Box<dyn Consensus>,
    supplier: Arc<dyn TransactionSupplier>,
    recorder: Arc<dyn StateSignatureRecorder>,
) -> (Dispatcher, Arc<EventMapper>, Arc<CountingEventAdded>) {
    let mapper = Arc::new(EventMapper::new(context.own_id));
    let quorum = Arc::new(RwLock::new(CriticalQuorum::new(Arc::new(context.address_book.clone()))));
    let tracker = Arc::new(TransactionTracker::new());
    let mut intake = EventIntake::new(context.clone(), consensus, mapper.clone(), quorum, tracker);
    let observer = Arc::new(CountingEventAdded(AtomicUsize::new(0)));
    intake.add_observer(observer.clone());
    let crypto: Arc<dyn CryptoEngine> = Arc::new(DefaultCryptoEngine::new(
        intake_config::SigningKeyPair::generate(&mut StdRng::from_seed([42u8; 32])),
    ));
    let dispatcher = Dispatcher::new(
        context,
        intake,
        crypto,
        Arc::new(EmptyPool),
        supplier,
        Arc::new(NoFreeze),
        recorder,
    );
    (dispatcher, mapper, observer)
}

/// §8 scenario 3: deliver the child before the parent; exactly two `eventAdded` notifications,
/// in causal order.
#[test]
fn link_then_admit_delivers_exactly_two_events_in_order() {
    let context = Context::new_for_test(vec![10, 10]);
    let drained = Arc::new(AtomicBool::new(false));
    let (mut dispatcher, _mapper, observer) = dispatcher_with(
        context,
        Box::new(StampingConsensus { round: 1 }),
        Arc::new(TrackingSupplier { drained }),
    );
    let factory = EventFactory::new();
    let parent = factory.genesis(0);
    let child = factory.child(&parent, None);

    dispatcher
        .intake_mut()
        .add_unlinked_event(child)
        .expect("recoverable errors never bubble up as Err");
    assert_eq!(observer.0.load(Ordering::SeqCst), 0, "child must wait for its parent");

    dispatcher
        .intake_mut()
        .add_unlinked_event(parent)
        .expect("recoverable errors never bubble up as Err");
    assert_eq!(observer.0.load(Ordering::SeqCst), 2, "both parent and child now admitted");
}

/// §8 scenario 4: both parents old (self-parent old, no other-parent known) must refuse to
/// create, log, and never touch the transaction supplier.
#[test]
fn both_parents_old_refuses_without_draining_the_pool() {
    let context = Context::new_for_test(vec![10, 10]);
    let drained = Arc::new(AtomicBool::new(false));
    let (mut dispatcher, mapper, _observer) = dispatcher_with(
        context,
        Box::new(OldConsensus),
        Arc::new(TrackingSupplier {
            drained: drained.clone(),
        }),
    );
    let factory = EventFactory::new();
    let genesis = factory.genesis(0);
    dispatcher.intake_mut().add_unlinked_event(genesis).unwrap();
    // Let node 1 start too, so the startup throttle isn't the reason creation is refused here.
    dispatcher.intake_mut().add_unlinked_event(factory.genesis(1)).unwrap();
    assert!(mapper.most_recent(0).is_some(), "our genesis must have been admitted first");

    // other_id = 3 is outside the two-node address book, so `otherParent` resolves to null —
    // combined with our own old self-parent, this is exactly the both-parents-old refusal.
    dispatcher.dispatch(Task::CreateSelfEvent(3)).unwrap();
    assert!(!drained.load(Ordering::SeqCst), "pool must not be drained when refusing to create");
    assert!(mapper.most_recent(0).unwrap().creator_seq() == 0, "no second self-event was created");
}

/// §8 scenario 6: re-admitting an already-admitted event increments the duplicate counter and
/// produces no further `eventAdded` notification.
#[test]
fn duplicate_admission_is_idempotent() {
    let context = Context::new_for_test(vec![10, 10]);
    let drained = Arc::new(AtomicBool::new(false));
    let (mut dispatcher, _mapper, observer) = dispatcher_with(
        context,
        Box::new(StampingConsensus { round: 1 }),
        Arc::new(TrackingSupplier { drained }),
    );
    let factory = EventFactory::new();
    let genesis = factory.genesis(0);

    dispatcher.intake_mut().add_unlinked_event(genesis.clone()).unwrap();
    assert_eq!(observer.0.load(Ordering::SeqCst), 1);

    dispatcher.intake_mut().add_unlinked_event(genesis).unwrap();
    assert_eq!(observer.0.load(Ordering::SeqCst), 1, "duplicate must not re-fire eventAdded");
}

/// System-transaction routing end to end: a peer's state-signature transaction reaches the
/// recorder once the event carrying it is admitted through the dispatcher, without any code
/// calling the handler directly.
#[test]
fn state_signature_reaches_recorder_through_full_admission() {
    let context = Context::new_for_test(vec![10, 10]);
    let calls = Arc::new(Mutex::new(Vec::new()));
    struct Spy(Arc<Mutex<Vec<(i64, intake_config::NodeId)>>>);
    impl StateSignatureRecorder for Spy {
        fn record_state_sig(&self, round: i64, member_id: intake_config::NodeId, _state_hash: Option<()>, _sig: &[u8]) {
            self.0.lock().unwrap().push((round, member_id));
        }
    }
    let drained = Arc::new(AtomicBool::new(false));
    let (mut dispatcher, _mapper, _observer) = dispatcher_with_recorder(
        context,
        Box::new(StampingConsensus { round: 1 }),
        Arc::new(TrackingSupplier { drained }),
        Arc::new(Spy(calls.clone())),
    );

    let factory = EventFactory::new();
    let genesis = factory.genesis(0);
    let event = factory.child_with_transactions(
        &genesis,
        None,
        vec![Transaction::System {
            creator: 1,
            kind: intake_core::transaction::SystemTransactionKind::StateSig {
                last_round_received: 9,
                signature_bytes: vec![0xAB],
            },
        }],
    );

    dispatcher.dispatch(Task::ValidatedEvent(genesis)).unwrap();
    dispatcher.dispatch(Task::ValidatedEvent(event)).unwrap();
    assert_eq!(*calls.lock().unwrap(), vec![(9, 1)]);
}
