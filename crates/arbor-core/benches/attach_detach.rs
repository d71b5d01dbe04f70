use arbor_core::{
    surface_for, BuildError, Builder, Bundle, Controller, Node, NodeContext, RouteError, Runtime,
    Scope, Slot, Tree,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const DEPTH_SAMPLES: &[usize] = &[4, 16, 64];
const FAN_OUT_SLOTS: [Slot; 8] = [
    Slot::new("s0"),
    Slot::new("s1"),
    Slot::new("s2"),
    Slot::new("s3"),
    Slot::new("s4"),
    Slot::new("s5"),
    Slot::new("s6"),
    Slot::new("s7"),
];

#[derive(Clone, Copy)]
struct Shape {
    depth: usize,
    fan_out: usize,
}

/// Attaches `fan_out` children per level until `depth` runs out.
struct Branch {
    shape: Shape,
}

impl Controller for Branch {
    type Event = ();

    fn activate(
        &mut self,
        cx: &mut NodeContext<'_, ()>,
        _saved: Option<&Bundle>,
    ) -> Result<(), RouteError> {
        if self.shape.depth == 0 {
            return Ok(());
        }
        let child = Shape {
            depth: self.shape.depth - 1,
            fan_out: self.shape.fan_out,
        };
        for slot in FAN_OUT_SLOTS.iter().take(self.shape.fan_out) {
            cx.router().attach(*slot, &BranchBuilder, child)?;
        }
        Ok(())
    }
}

struct BranchBuilder;

impl Builder for BranchBuilder {
    type Args = Shape;

    fn kind(&self) -> &'static str {
        "branch"
    }

    fn build(&self, parent: &Scope, shape: Shape) -> Result<Node, BuildError> {
        let scope = parent.extend("branch").build();
        let surface = surface_for(&scope, "branch");
        Ok(Node::new("branch", scope, surface, Branch { shape }))
    }
}

fn node_count(shape: Shape) -> usize {
    (0..=shape.depth).map(|level| shape.fan_out.pow(level as u32)).sum()
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach_detach_chain");
    for &depth in DEPTH_SAMPLES {
        let shape = Shape { depth, fan_out: 1 };
        group.bench_with_input(
            BenchmarkId::new("nodes", node_count(shape)),
            &shape,
            |b, &shape| {
                let mut tree = Tree::with_memory_window(Runtime::default(), Scope::root());
                b.iter(|| {
                    tree.launch(&BranchBuilder, shape, None).expect("launch");
                    black_box(tree.shutdown());
                });
            },
        );
    }
    group.finish();
}

fn bench_fan_out(c: &mut Criterion) {
    let shape = Shape {
        depth: 3,
        fan_out: FAN_OUT_SLOTS.len(),
    };
    let mut tree = Tree::with_memory_window(Runtime::default(), Scope::root());

    c.bench_function("attach_detach_fan_out", |b| {
        b.iter(|| {
            tree.launch(&BranchBuilder, shape, None).expect("launch");
            black_box(tree.shutdown());
        });
    });
}

criterion_group!(attach_detach, bench_chain, bench_fan_out);
criterion_main!(attach_detach);
