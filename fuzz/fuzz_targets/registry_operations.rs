#![no_main]

use keyed_di::{entry, factory, value, Callable, Container, ContainerBuilder, MemoryCache, Value};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

const IDS: [&str; 6] = ["a", "b", "c", "d", "e", "container"];

fuzz_target!(|data: &[u8]| {
    let cache = Arc::new(MemoryCache::new());
    let Ok(container) = ContainerBuilder::new().cache(cache.clone()).build() else {
        return;
    };
    let child = Container::new();

    // Each pair of bytes is one operation on one identifier
    for chunk in data.chunks_exact(2) {
        let id = IDS[(chunk[1] % IDS.len() as u8) as usize];
        let target = IDS[((chunk[1] >> 4) % IDS.len() as u8) as usize];

        match chunk[0] % 8 {
            0 => {
                let _ = container.set(id, chunk[1] as i64);
            }
            1 => {
                let _ = container.set(id, value(id, chunk[1] & 1 == 0));
            }
            2 => {
                // may create cycles; they must be reported, not overflow the stack
                let passthrough = Callable::new(|args| Ok(args.into_iter().next().unwrap_or_default()));
                let _ = container.set(id, factory(passthrough, vec![entry(target).into()], chunk[1] & 1 == 0));
            }
            3 => {
                let _ = container.delete(id);
            }
            4 => {
                let _ = child.set(id, Value::from(format!("child.{id}")));
            }
            5 => {
                let _ = container.add_child(&child);
            }
            6 => {
                let has = container.has(id).unwrap_or(false);
                let found = container.get(id);
                if !has {
                    assert!(found.is_err());
                }
            }
            _ => {
                let _ = container.clear_cache();
            }
        }
    }

    // A reloaded container sees every persisted value
    let Ok(reloaded) = ContainerBuilder::new().cache(cache).build() else {
        return;
    };
    for id in reloaded.ids() {
        assert!(reloaded.get(&id).is_ok());
    }
});
