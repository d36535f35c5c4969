//! Counter Example
//!
//! Demonstrates flowstate with a counter store, console logging middleware,
//! and time travel over the recorded action log.
//!
//! Run with `RUST_LOG=flowstate=debug` to see every action as it is logged.
//! Pass a path to a RON `DevtoolsConfig` to override the defaults.

use flowstate_core::{Action, ActionFactory, ActionMetadata, Registry, Store};
use flowstate_journal::{register_replayable, Devtools, DevtoolsConfig, ExportFormat};
use serde::Serialize;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
struct CounterState {
    counter: i64,
    label: String,
}

#[derive(Debug, Clone, Serialize)]
struct Rename {
    label: String,
}

struct CounterStore {
    store: Store<CounterState>,
    increment: Action<i64>,
    rename: Action<Rename>,
}

impl CounterStore {
    fn new(factory: Rc<dyn ActionFactory>) -> Self {
        let store = Store::with_factory(
            CounterState {
                counter: 0,
                label: "counter".to_string(),
            },
            factory,
        );

        let increment = store.create_action_and_subscribe(
            Some(ActionMetadata::new("increment")),
            |store, n: &i64| {
                store.update_state(|s| CounterState {
                    counter: s.counter + n,
                    ..s.clone()
                })
            },
        );
        let rename = store.create_action_and_subscribe(
            Some(ActionMetadata::new("rename")),
            |store, rename: &Rename| {
                store.update_state(|s| CounterState {
                    label: rename.label.clone(),
                    ..s.clone()
                })
            },
        );

        Self {
            store,
            increment,
            rename,
        }
    }
}

fn load_config() -> Result<DevtoolsConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(DevtoolsConfig::from_ron(&std::fs::read_to_string(path)?)?),
        None => Ok(DevtoolsConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Flowstate Counter Example ===\n");

    let config = load_config()?;
    println!("Devtools config:\n{}\n", config.to_ron()?);

    let registry = Rc::new(Registry::new());
    let devtools = Devtools::install(&registry, &config)?;

    let counter = CounterStore::new(registry.resolve::<dyn ActionFactory>()?);
    register_replayable(&registry, &counter.store);

    let _subscription = counter.store.subscribe(|state| {
        println!("  state: {} = {}", state.label, state.counter);
    });

    println!("\nTriggering actions...");
    counter.increment.trigger(1);
    counter.increment.trigger(2);
    counter.rename.trigger(Rename {
        label: "clicks".to_string(),
    });
    counter.increment.trigger(3);

    let traveler = devtools.time_traveler();

    println!("\nReplaying to event #1...");
    traveler.replay_to(1)?;
    println!("  position: {:?}", traveler.position());

    println!("\nStepping forward...");
    while traveler.step_forward()? {
        println!("  state now: {:?}", traveler.state());
    }

    println!("\nBranching from event #0...");
    traveler.replay_to(0)?;
    counter.increment.trigger(10);
    println!("  replay state: {:?}", traveler.state());

    println!("\n{}", devtools.report());
    println!("{}", devtools.export(ExportFormat::Text)?);

    println!("=== Simulation Complete ===");
    Ok(())
}
