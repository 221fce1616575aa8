use linebasic::error::RuntimeErrorKind;
use linebasic::{BufferedConsole, Canvas, Executor, Value};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

type TestExecutor = Executor<BufferedConsole, Canvas>;

fn executor_with_input(input: &[&str]) -> TestExecutor {
    Executor::with_io(
        BufferedConsole::with_input(input.iter().copied()),
        Canvas::with_dimensions(32, 32),
    )
    .with_seed(1)
}

/// Load and run a program, returning its console lines
fn run_program(source: &str) -> Vec<String> {
    let mut executor = executor_with_input(&[]);
    executor.load(source).unwrap();
    let _ = executor.run();
    executor.console().lines().to_vec()
}

#[test]
fn test_hello_world() {
    assert_eq!(run_program("10 PRINT \"Hello, World!\"\n20 END"), vec!["Hello, World!"]);
}

#[test]
fn test_lines_run_in_numeric_order() {
    let source = "30 PRINT \"three\"\n10 PRINT \"one\"\n20 PRINT \"two\"";
    assert_eq!(run_program(source), vec!["one", "two", "three"]);
}

#[test]
fn test_gosub_subroutine_order() {
    let source = "\
10 PRINT \"start\"
20 GOSUB 100
30 PRINT \"middle\"
40 GOSUB 100
50 END
100 PRINT \"in sub\"
110 RETURN";
    assert_eq!(
        run_program(source),
        vec!["start", "in sub", "middle", "in sub"]
    );
}

#[test]
fn test_nested_gosub() {
    let source = "\
10 GOSUB 100
20 PRINT \"done\"
30 END
100 GOSUB 200
110 PRINT \"outer\"
120 RETURN
200 PRINT \"inner\"
210 RETURN";
    assert_eq!(run_program(source), vec!["inner", "outer", "done"]);
}

#[test]
fn test_for_loop_variants() {
    assert_eq!(
        run_program("10 FOR I = 1 TO 3\n20 PRINT I\n30 NEXT I"),
        vec!["1", "2", "3"]
    );
    assert_eq!(
        run_program("10 FOR I = 3 TO 1 STEP -1\n20 PRINT I\n30 NEXT I"),
        vec!["3", "2", "1"]
    );
    assert_eq!(
        run_program("10 FOR I = 1 TO 0\n20 PRINT I\n30 NEXT I\n40 PRINT \"after\""),
        vec!["after"]
    );
}

#[test]
fn test_loop_variable_after_for() {
    let mut executor = executor_with_input(&[]);
    executor.load("10 FOR I = 1 TO 3\n20 NEXT").unwrap();
    executor.run().unwrap();
    assert_eq!(executor.variable("I"), Value::Integer(4));
}

#[test]
fn test_while_loop_sums() {
    let source = "\
10 N = 1
20 S = 0
30 WHILE N <= 10
40 S = S + N
50 N = N + 1
60 WEND
70 PRINT S";
    assert_eq!(run_program(source), vec!["55"]);
}

#[test]
fn test_arithmetic_results() {
    let source = "\
10 PRINT 2 + 3 * 4
20 PRINT 2 ^ 3 ^ 2
30 PRINT 10 / 4
40 PRINT -2 ^ 2
50 PRINT (1 + 2) * 3
60 PRINT \"AB\" + \"CD\"";
    assert_eq!(
        run_program(source),
        vec!["14", "512", "2.5", "4", "9", "ABCD"]
    );
}

#[test]
fn test_comparisons_and_logic() {
    let source = "\
10 PRINT 3 > 2
20 PRINT 3 < 2
30 PRINT 1 = 1 AND 2 <> 3
40 PRINT 0 OR 0
50 PRINT NOT 0
60 PRINT \"A\" < \"B\"
70 PRINT 1 != 2";
    assert_eq!(run_program(source), vec!["1", "0", "1", "0", "1", "1", "1"]);
}

#[test]
fn test_undefined_variable_is_zero() {
    assert_eq!(run_program("10 PRINT X\n20 PRINT Y + 5"), vec!["0", "5"]);
}

#[test]
fn test_string_variables_and_functions() {
    let source = "\
10 N$ = \"World\"
20 PRINT \"Hello \"; N$
30 PRINT LEN(N$)
40 PRINT CHR(65 + 1); ASC(\"a\")";
    assert_eq!(run_program(source), vec!["Hello World", "5", "B97"]);
}

#[test]
fn test_division_by_zero_reports_and_stops() {
    let mut executor = executor_with_input(&[]);
    executor
        .load("10 PRINT \"before\"\n20 X = 1 / 0\n30 PRINT \"after\"")
        .unwrap();
    let err = executor.run().unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::DivisionByZero);
    assert_eq!(err.line, 20);
    assert_eq!(
        executor.console().lines(),
        [
            "before".to_string(),
            "Runtime Error at line 20: Division by zero".to_string()
        ]
    );
    assert_eq!(executor.variable("X"), Value::Integer(0));
    assert_eq!(executor.last_error(), Some(&err));
}

#[test]
fn test_control_flow_errors() {
    let cases = [
        ("10 NEXT", RuntimeErrorKind::NextWithoutFor),
        ("10 WEND", RuntimeErrorKind::WendWithoutWhile),
        ("10 RETURN", RuntimeErrorKind::ReturnWithoutGosub),
        ("10 GOSUB 500", RuntimeErrorKind::LineNotFound(500)),
        ("10 WHILE 0\n20 PRINT 1", RuntimeErrorKind::WhileWithoutWend),
        ("10 FOR I = 9 TO 1\n20 PRINT I", RuntimeErrorKind::ForWithoutNext),
    ];
    for (source, expected) in cases {
        let mut executor = executor_with_input(&[]);
        executor.load(source).unwrap();
        let err = executor.run().unwrap_err();
        assert_eq!(err.kind, expected, "{}", source);
        assert!(!executor.is_running());
    }
}

#[test]
fn test_input_prompts_and_types() {
    let mut executor = executor_with_input(&["Ada", "36", "1.75"]);
    executor
        .load("10 INPUT \"Name\"; N$\n20 INPUT A\n30 INPUT \"Height\", H\n40 PRINT N$; \" \"; A + 1; \" \"; H")
        .unwrap();
    executor.run().unwrap();
    assert_eq!(executor.console().prompts(), ["Name ", "? ", "Height "]);
    assert_eq!(executor.console().lines(), ["Ada 37 1.75".to_string()]);
}

#[test]
fn test_if_with_line_number_branches() {
    let source = "\
10 X = 0
20 X = X + 1
30 IF X < 3 THEN 20 ELSE 40
40 PRINT X";
    assert_eq!(run_program(source), vec!["3"]);
}

#[test]
fn test_apostrophe_comment_and_rem() {
    let source = "\
10 ' setup
20 REM nothing happens here
30 PRINT 'quoted'";
    assert_eq!(run_program(source), vec!["quoted"]);
}

#[test]
fn test_run_keeps_variables_between_runs() {
    let mut executor = executor_with_input(&[]);
    executor.load("10 C = C + 1").unwrap();
    executor.run().unwrap();
    executor.run().unwrap();
    assert_eq!(executor.variable("C"), Value::Integer(2));
}

#[test]
fn test_interrupt_from_another_thread() {
    let mut executor = executor_with_input(&[]);
    executor.load("10 X = X + 1\n20 GOTO 10").unwrap();
    let handle = executor.interrupt_handle();

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.store(true, Ordering::SeqCst);
    });
    executor.run().unwrap();
    stopper.join().unwrap();

    assert_eq!(
        executor.console().lines().last().map(String::as_str),
        Some("Program interrupted")
    );
    assert!(!executor.is_running());
    assert!(matches!(executor.variable("X"), Value::Integer(n) if n > 0));
}

#[test]
fn test_immediate_mode_statements() {
    let mut executor = executor_with_input(&[]);
    executor.execute_immediate("X = 6 * 7").unwrap();
    executor.execute_immediate("PRINT X").unwrap();
    assert_eq!(executor.console().lines(), ["42".to_string()]);
}
