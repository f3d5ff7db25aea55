//! Property-based tests for autowiring
//!
//! These tests check candidate selection against randomly shaped class
//! chains and candidate sets.

use ferrous_wire::{
    Autowired, ClassInfo, DefinitionStore, PlanAssembler, ServiceDefinition, TypeName, TypeRegistry, WireError,
};
use proptest::prelude::*;

/// `T0 <- T1 <- ... <- Tn`, each extending the previous one.
fn chain(length: usize) -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types.add_class(ClassInfo::interface("T0"));
    for i in 1..length {
        types.add_class(ClassInfo::class(format!("T{}", i)).extends(format!("T{}", i - 1)));
    }
    types
}

fn ty(i: usize) -> TypeName {
    TypeName::from(format!("T{}", i))
}

// Property: narrowed to Tk, a definition of type Tn serves exactly Tk..=Tn
proptest! {
    #[test]
    fn narrowing_serves_the_narrowed_type_and_below(length in 2usize..8, seed in any::<usize>()) {
        let leaf = length - 1;
        let narrowed = seed % length;
        let types = chain(length);
        let mut store = DefinitionStore::new();
        store.add("svc", ServiceDefinition::of_type(ty(leaf)).autowired_as([ty(narrowed)])).unwrap();

        let graph = PlanAssembler::new(&types).assemble(&mut store).unwrap();
        for required in 0..length {
            let served = graph.autowire(&ty(required)).is_ok();
            prop_assert_eq!(served, required >= narrowed, "T{} narrowed to T{}", required, narrowed);
        }
    }
}

// Property: without preference, several candidates are always ambiguous and
// listed in definition order
proptest! {
    #[test]
    fn unpreferred_candidates_are_ambiguous(count in 2usize..6, disabled in any::<bool>()) {
        let types = chain(2);
        let mut store = DefinitionStore::new();
        let mut names = Vec::new();
        for i in 0..count {
            let name = format!("svc{}", i);
            store.add(name.clone(), ServiceDefinition::of_type("T1")).unwrap();
            names.push(name);
        }
        if disabled {
            store
                .add("off", ServiceDefinition::of_type("T1").with_autowired(Autowired::Disabled))
                .unwrap();
        }

        let graph = PlanAssembler::new(&types).assemble(&mut store).unwrap();
        match graph.autowire(&ty(0)) {
            Err(WireError::AmbiguousService { candidates, .. }) => prop_assert_eq!(candidates, names),
            other => prop_assert!(false, "expected ambiguity, got {:?}", other),
        }
    }
}

// Property: exactly one preferred candidate always wins
proptest! {
    #[test]
    fn single_preference_wins(count in 2usize..6, seed in any::<usize>()) {
        let types = chain(2);
        let winner = seed % count;
        let mut store = DefinitionStore::new();
        for i in 0..count {
            let mut definition = ServiceDefinition::of_type("T1");
            if i == winner {
                definition = definition.preferred_for("T0");
            }
            store.add(format!("svc{}", i), definition).unwrap();
        }

        let graph = PlanAssembler::new(&types).assemble(&mut store).unwrap();
        let expected = format!("svc{}", winner);
        prop_assert_eq!(graph.autowire(&ty(0)).unwrap(), expected.as_str());
        // preference is per type; T1 itself stays ambiguous
        prop_assert!(graph.autowire(&ty(1)).is_err());
    }
}
