// tests/graph_scenarios.rs

use graphrt::{
    EngineError, GraphModule, ModuleError, NodeId, ParseError, RuntimeModule, Shape, Tensor,
};

const SINGLE_ADD: &str = "\
subgraph_0
input 0 10 10
input 1 10 10
add 2 inputs: 0 1 shape: 10 10
";

const CHAIN: &str = "\
subgraph_0
input 0 10 10
input 1 10 10
input 2 10 10
input 3 10 10
mul 4 inputs: 0 1 shape: 10 10
sub 5 inputs: 4 2 shape: 10 10
add 6 inputs: 5 3 shape: 10 10
";

fn square(v: f32) -> Tensor {
    Tensor::filled(Shape::new(vec![10, 10]), v)
}

fn ramp(offset: f32) -> Tensor {
    let data = (0..100).map(|i| i as f32 * 0.25 + offset).collect();
    Tensor::new(Shape::new(vec![10, 10]), data).unwrap()
}

#[test]
fn scenario_single_add() {
    let mut module = GraphModule::create_from_text(SINGLE_ADD).unwrap();
    let mut out = square(0.0);

    module
        .get_callable("subgraph_0")
        .unwrap()
        .call(&[&square(2.0), &square(3.0)], &mut out)
        .unwrap();

    assert_eq!(out.shape.dims, vec![10, 10]);
    assert!(out.data.iter().all(|&x| x == 5.0));
}

#[test]
fn scenario_mul_sub_add_chain() {
    let mut module = GraphModule::create_from_text(CHAIN).unwrap();
    let inputs = [ramp(1.0), ramp(-2.0), ramp(0.5), square(7.0)];
    let refs: Vec<&Tensor> = inputs.iter().collect();
    let mut out = square(0.0);

    module.run("subgraph_0", &refs, &mut out).unwrap();

    for i in 0..100 {
        let expected =
            ((inputs[0].data[i] * inputs[1].data[i]) - inputs[2].data[i]) + inputs[3].data[i];
        assert_eq!(out.data[i], expected, "element {}", i);
    }
}

#[test]
fn scenario_undeclared_reference_fails_construction() {
    let text = "subgraph_0\ninput 0 10 10\nadd 2 inputs: 0 1 shape: 10 10\n";
    let err = GraphModule::create_from_text(text).unwrap_err();
    assert!(matches!(
        err,
        ModuleError::Parse(ParseError::Malformed { line: 3, .. })
    ));
}

#[test]
fn unknown_operator_fails_construction() {
    let text = "subgraph_0\ninput 0 1\ninput 1 1\npow 2 inputs: 0 1 shape: 1\n";
    assert!(matches!(
        GraphModule::create_from_text(text),
        Err(ModuleError::Parse(ParseError::UnknownOperator { .. }))
    ));
}

#[test]
fn oversized_declarations_fail_construction() {
    let cases = [
        "subgraph_0\ninput 0 4294967296 4294967296 16\ninput 1 1\nadd 2 inputs: 0 1 shape: 1\n",
        "subgraph_0\ninput 9223372036854775807 1\ninput 1 1\nadd 2 inputs: 1 1 shape: 1\n",
    ];
    for text in cases {
        assert!(matches!(
            GraphModule::create_from_text(text),
            Err(ModuleError::Parse(ParseError::Malformed { line: 2, .. }))
        ));
    }
}

#[test]
fn unknown_subgraph() {
    let mut module = GraphModule::create_from_text(SINGLE_ADD).unwrap();
    assert!(matches!(
        module.get_callable("subgraph_1"),
        Err(ModuleError::Engine(EngineError::UnknownSubgraph(_)))
    ));

    let mut out = square(0.0);
    assert!(matches!(
        module.run("subgraph_1", &[], &mut out),
        Err(ModuleError::Engine(EngineError::UnknownSubgraph(_)))
    ));
}

#[test]
fn reruns_use_each_calls_own_inputs() {
    let mut module = GraphModule::create_from_text(CHAIN).unwrap();
    let mut callable = module.get_callable("subgraph_0").unwrap();

    let mut first = square(0.0);
    callable
        .call(&[&square(2.0), &square(3.0), &square(1.0), &square(4.0)], &mut first)
        .unwrap();
    assert!(first.data.iter().all(|&x| x == 9.0));

    let mut second = square(0.0);
    callable
        .call(&[&square(-1.0), &square(5.0), &square(0.0), &square(0.5)], &mut second)
        .unwrap();
    assert!(second.data.iter().all(|&x| x == -4.5));
    assert!(first.data.iter().all(|&x| x == 9.0));
}

#[test]
fn round_trip_executes_identically() {
    let mut original = GraphModule::create_from_text(CHAIN).unwrap();
    let mut restored = GraphModule::deserialize(&original.serialize()).unwrap();

    let inputs = [ramp(0.0), ramp(1.0), ramp(2.0), ramp(3.0)];
    let refs: Vec<&Tensor> = inputs.iter().collect();

    let mut a = square(0.0);
    let mut b = square(0.0);
    original.run("subgraph_0", &refs, &mut a).unwrap();
    restored.run("subgraph_0", &refs, &mut b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn pool_is_shared_across_subgraphs() {
    // subgraph_1 reads slot 2, which only subgraph_0 writes
    let text = "\
subgraph_0
input 0 2
input 1 2
add 2 inputs: 0 1 shape: 2
subgraph_1
mul 3 inputs: 2 2 shape: 2
";
    let mut module = GraphModule::create_from_text(text).unwrap();
    let two = |v| Tensor::filled(Shape::new(vec![2]), v);

    let mut out = two(0.0);
    module.run("subgraph_1", &[], &mut out).unwrap();
    assert_eq!(out.data, vec![0.0, 0.0]);

    module.run("subgraph_0", &[&two(1.0), &two(2.0)], &mut out).unwrap();
    assert_eq!(out.data, vec![3.0, 3.0]);

    module.run("subgraph_1", &[], &mut out).unwrap();
    assert_eq!(out.data, vec![9.0, 9.0]);
}

#[test]
fn inputs_are_positional_not_by_declared_id() {
    // ids 0 and 1 are declared in reverse; inputs still land in slots 0, 1
    let text = "subgraph_0\ninput 1 1\ninput 0 1\nsub 2 inputs: 1 0 shape: 1\n";
    let mut module = GraphModule::create_from_text(text).unwrap();
    let one = |v| Tensor::filled(Shape::new(vec![1]), v);

    let mut out = one(0.0);
    module.run("subgraph_0", &[&one(10.0), &one(4.0)], &mut out).unwrap();
    // slot 1 holds 4.0, slot 0 holds 10.0
    assert_eq!(out.data, vec![-6.0]);
}

#[test]
fn last_slot_reflects_latest_run() {
    let mut module = GraphModule::create_from_text(SINGLE_ADD).unwrap();
    let mut out = square(0.0);
    module.run("subgraph_0", &[&square(1.0), &square(1.0)], &mut out).unwrap();

    let last = module.last_slot().unwrap();
    assert_eq!(last, module.graph().pool.get(NodeId(2)).unwrap());
    assert!(last.data.iter().all(|&x| x == 2.0));
}
