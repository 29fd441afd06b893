use criterion::{Bencher, Criterion, black_box, criterion_group, criterion_main};
use ippcode::Interpreter;

/// Runs a benchmark program to completion and checks its output once, then
/// measures repeated runs of the already-loaded program.
fn run_program(bench: &mut Bencher, source: &str, expected_stdout: &str) {
    let interpreter = Interpreter::new(source).unwrap();
    let output = interpreter.run_collect(&[]).unwrap();
    assert_eq!(output.stdout, expected_stdout);

    bench.iter(|| {
        let output = interpreter.run_collect(&[]).unwrap();
        black_box(output.stdout);
    });
}

/// A counting loop: arithmetic, comparison, and a backward conditional jump
/// per iteration.
fn counting_loop_source(iterations: u32) -> String {
    format!(
        r#"<program language="IPPcode22">
  <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@i</arg1></instruction>
  <instruction order="2" opcode="MOVE"><arg1 type="var">GF@i</arg1><arg2 type="int">0</arg2></instruction>
  <instruction order="3" opcode="LABEL"><arg1 type="label">loop</arg1></instruction>
  <instruction order="4" opcode="ADD"><arg1 type="var">GF@i</arg1><arg2 type="var">GF@i</arg2><arg3 type="int">1</arg3></instruction>
  <instruction order="5" opcode="JUMPIFNEQ"><arg1 type="label">loop</arg1><arg2 type="var">GF@i</arg2><arg3 type="int">{iterations}</arg3></instruction>
  <instruction order="6" opcode="WRITE"><arg1 type="var">GF@i</arg1></instruction>
</program>"#
    )
}

/// Same loop on the operand stack opcodes.
fn stack_loop_source(iterations: u32) -> String {
    format!(
        r#"<program language="IPPcode22">
  <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@i</arg1></instruction>
  <instruction order="2" opcode="MOVE"><arg1 type="var">GF@i</arg1><arg2 type="int">0</arg2></instruction>
  <instruction order="3" opcode="LABEL"><arg1 type="label">loop</arg1></instruction>
  <instruction order="4" opcode="PUSHS"><arg1 type="var">GF@i</arg1></instruction>
  <instruction order="5" opcode="PUSHS"><arg1 type="int">1</arg1></instruction>
  <instruction order="6" opcode="ADDS"></instruction>
  <instruction order="7" opcode="POPS"><arg1 type="var">GF@i</arg1></instruction>
  <instruction order="8" opcode="PUSHS"><arg1 type="var">GF@i</arg1></instruction>
  <instruction order="9" opcode="PUSHS"><arg1 type="int">{iterations}</arg1></instruction>
  <instruction order="10" opcode="JUMPIFNEQS"><arg1 type="label">loop</arg1></instruction>
  <instruction order="11" opcode="WRITE"><arg1 type="var">GF@i</arg1></instruction>
</program>"#
    )
}

fn bench_interpret(c: &mut Criterion) {
    c.bench_function("counting_loop_1000", |b| {
        run_program(b, &counting_loop_source(1000), "1000");
    });
    c.bench_function("stack_loop_1000", |b| {
        run_program(b, &stack_loop_source(1000), "1000");
    });
    c.bench_function("load_counting_loop", |b| {
        let source = counting_loop_source(1000);
        b.iter(|| black_box(Interpreter::new(&source).unwrap()));
    });
}

criterion_group!(benches, bench_interpret);
criterion_main!(benches);
