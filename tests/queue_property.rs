use std::sync::Arc;

use proptest::prelude::*;
use tooltask::output::{OutputQueues, StreamKind};

#[derive(Debug, Clone)]
enum Op {
    Push(StreamKind, u16),
    Drain(StreamKind),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let stream = prop_oneof![Just(StreamKind::Stdout), Just(StreamKind::Stderr)];
    prop_oneof![
        3 => (stream.clone(), any::<u16>()).prop_map(|(s, n)| Op::Push(s, n)),
        1 => stream.prop_map(Op::Drain),
    ]
}

proptest! {
    // Whatever the interleaving of pushes and drains, each stream yields
    // exactly what was pushed to it, in push order.
    #[test]
    fn drains_lose_nothing_and_keep_order(ops in proptest::collection::vec(op_strategy(), 0..200)) {
        let queues = OutputQueues::new();
        let mut pushed_out = Vec::new();
        let mut pushed_err = Vec::new();
        let mut seen_out = Vec::new();
        let mut seen_err = Vec::new();

        for op in ops {
            match op {
                Op::Push(stream, n) => {
                    let line = n.to_string();
                    prop_assert!(queues.get(stream).push(line.clone()));
                    match stream {
                        StreamKind::Stdout => pushed_out.push(line),
                        StreamKind::Stderr => pushed_err.push(line),
                    }
                }
                Op::Drain(StreamKind::Stdout) => seen_out.extend(queues.stdout.drain()),
                Op::Drain(StreamKind::Stderr) => seen_err.extend(queues.stderr.drain()),
            }
        }
        seen_out.extend(queues.stdout.drain());
        seen_err.extend(queues.stderr.drain());

        prop_assert_eq!(seen_out, pushed_out);
        prop_assert_eq!(seen_err, pushed_err);
        prop_assert!(!queues.stdout.has_data() && !queues.stderr.has_data());
    }

    // After disposal no push is accepted.
    #[test]
    fn nothing_enters_a_disposed_queue(lines in proptest::collection::vec(".*", 1..20)) {
        let queues = OutputQueues::new();
        queues.dispose();
        let stdout = Arc::clone(&queues.stdout);
        for line in lines {
            prop_assert!(!stdout.push(line));
        }
        prop_assert!(stdout.is_empty());
    }
}
