use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use togm::graph::{GraphDefinition, NodeDefinition, Property, Reference, RelationshipDefinition};
use togm::query::{Condition, FindQuery, PropertyCondition, Selection};
use togm::{props, CommandBatch};

fn movie_graph() -> GraphDefinition {
    GraphDefinition::builder()
        .node(
            "Movie",
            NodeDefinition::new()
                .property("title", Property::string())
                .property("released", Property::number())
                .property("tagline", Property::string().nullable())
                .reference("actors", Reference::many("ACTED_IN", "Person").incoming()),
        )
        .node(
            "Person",
            NodeDefinition::new()
                .property("name", Property::string())
                .property("born", Property::number().nullable())
                .reference("moviesActedIn", Reference::many("ACTED_IN", "Movie")),
        )
        .relationship(
            "ACTED_IN",
            RelationshipDefinition::new().property("roles", Property::string().array()),
        )
        .build()
        .unwrap()
}

/// Alternate Movie -> actors -> moviesActedIn down to `depth` levels
fn nested_selection(depth: usize) -> Selection {
    (0..depth).fold(Selection::new(), |inner, level| {
        let reference = if (depth - level) % 2 == 1 { "actors" } else { "moviesActedIn" };
        Selection::new().follow(reference, inner)
    })
}

/// Benchmark selection compilation by nesting depth
fn bench_selection_depth(c: &mut Criterion) {
    let graph = movie_graph();
    let mut group = c.benchmark_group("selection_depth");

    for depth in [0usize, 2, 4, 8].iter() {
        let selection = nested_selection(*depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, _| {
            b.iter(|| {
                let query = FindQuery::new(&graph, "Movie", &selection, &Condition::new()).unwrap();
                black_box(query.statement());
            });
        });
    }
    group.finish();
}

/// Benchmark condition compilation by number of OR-ed terms
fn bench_condition_width(c: &mut Criterion) {
    let graph = movie_graph();
    let mut group = c.benchmark_group("condition_width");

    for width in [1usize, 10, 100].iter() {
        let mut any = Condition::new();
        for i in 0..*width {
            any = any.property("released", PropertyCondition::ge(1900 + i as i64).merge(PropertyCondition::lt(2000)));
        }
        let condition = Condition::new().any(any).property("title", PropertyCondition::starts_with("The"));

        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, _| {
            b.iter(|| {
                let query = FindQuery::new(&graph, "Movie", &Selection::new(), &condition).unwrap();
                black_box(query.statement());
            });
        });
    }
    group.finish();
}

/// Benchmark building a large command batch
fn bench_command_batch(c: &mut Criterion) {
    c.bench_function("command_batch_10k", |b| {
        b.iter(|| {
            let mut batch = CommandBatch::new();
            let mut previous = None;
            for i in 0..10_000i64 {
                let id = batch.create_node(["Person"], props! { "name" => format!("Person{}", i) });
                if let Some(previous) = previous {
                    batch.create_relationship("KNOWS", previous, id, props! {});
                }
                previous = Some(id);
            }
            black_box(batch.len());
        });
    });
}

criterion_group!(benches, bench_selection_depth, bench_condition_width, bench_command_batch);
criterion_main!(benches);
