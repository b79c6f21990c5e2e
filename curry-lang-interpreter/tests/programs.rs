use curry_lang_interpreter::{run, Error, ErrorKind};

fn run_program(source: &str) -> (Result<(), Error>, String) {
    let mut output = Vec::new();
    let result = run(source, &mut output).map(|_| ());
    (result, String::from_utf8(output).unwrap())
}

fn expect_output(source: &str, expected: &str) {
    let (result, output) = run_program(source);
    assert_eq!(result, Ok(()), "source: {source:?}");
    assert_eq!(output, expected, "source: {source:?}");
}

fn expect_error(source: &str, kind: ErrorKind) -> Error {
    let (result, _) = run_program(source);
    match result {
        Err(err) => {
            assert_eq!(err.kind, kind, "source: {source:?}, error: {err}");
            err
        }
        Ok(()) => panic!("expected {kind} for {source:?}"),
    }
}

const FIZZBUZZ: &str = r#"
fizzbuzz := fn n rules ->
    (1..n) .map fn i ->
        res := ""
        for (m, s) <- rules:
            if i % m == 0 then res += s
        if res == "" then `{i}` else res
    .join "\n"

15 .fizzbuzz [(3, "Fizz"), (5, "Buzz")] .print
"#;

#[test]
fn fizzbuzz() {
    let (result, output) = run_program(FIZZBUZZ);
    assert_eq!(result, Ok(()));

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 15);
    assert_eq!(&lines[..5], &["1", "2", "Fizz", "4", "Buzz"]);
    assert_eq!(lines[9], "Buzz");
    assert_eq!(lines[14], "FizzBuzz");
}

#[test]
fn application_forms_in_one_program() {
    let source = r#"
add := fn a b -> a + b
println! (add 1 2)
add 1, 2 |> println!
1 .add 2 |> println!
1 |> add 2 |> println!
inc := add 1
println! (inc 41)
"#;
    expect_output(source, "3\n3\n3\n3\n42\n");
}

#[test]
fn trailing_lambda_captures_the_pipe() {
    expect_output("1..5 |> map fn x -> x * x |> print", "1\n4\n9\n16\n25\n");
}

#[test]
fn closures_capture_their_scope() {
    let source = r#"
counter := fn start ->
    fn step -> start + step
from_ten := counter 10
print (from_ten 5)
print (counter 0 7)
"#;
    expect_output(source, "15\n7\n");
}

#[test]
fn recursion_through_the_enclosing_scope() {
    let source = r#"
factorial := fn n ->
    if n < 2 then 1 else n * (factorial (n - 1))
print (factorial 10)
"#;
    expect_output(source, "3628800\n");
}

#[test]
fn tuple_destructuring_and_loops() {
    let source = r#"
pairs := [(1, "one"), (2, "two")]
for (n, name) <- pairs:
    print `{n} is {name}`
(a, (b, c)) := (1, (2, 3))
total := 0
i := 0
while i < 3:
    i += 1
    total += i
print (a + b + c + total)
"#;
    expect_output(source, "1 is one\n2 is two\n12\n");
}

#[test]
fn sequence_builtins() {
    let source = r#"
xs := [3, 1, 2]
xs ++= [4]
print (xs .reverse)
print ((range 1 3) ++ [9])
print ([1, 2] .join ", ")
print! "no newline"
"#;
    expect_output(source, "[4, 2, 1, 3]\n[1, 2, 3, 9]\n1, 2\nno newline");
}

/// `++` builds a new list; only `++=` changes the binding.
#[test]
fn concatenation_does_not_mutate() {
    let source = r#"
res = [1]
res ++ [2]
print res
res ++= [2]
print res
"#;
    expect_output(source, "[1]\n[1, 2]\n");
}

#[test]
fn runtime_errors() {
    let err = expect_error("x := 1\nprint bar", ErrorKind::UnboundName);
    assert!(!err.kind.is_static());
    assert_eq!(err.position.line, 2);
    assert!(err.to_string().starts_with("error[unbound-name] 2:7: "));

    expect_error("for (m, s) <- [(1, 2, 3)]: print m", ErrorKind::PatternMismatch);
    expect_error("1 / 0", ErrorKind::DivisionByZero);
    expect_error("1 2", ErrorKind::NotCallable);
    expect_error("1 + \"a\"", ErrorKind::TypeMismatch);
}

#[test]
fn deep_recursion_is_an_error() {
    let count = "count := fn n -> if n == 0 then 0 else count (n - 1)\n";
    expect_output(&format!("{count}print (count 5000)"), "0\n");

    let err = expect_error(&format!("{count}print (count 100000)"), ErrorKind::RecursionLimit);
    assert!(!err.kind.is_static());
    assert!(err.to_string().starts_with("error[recursion-limit] "));
}

#[test]
fn grouped_pipe_target_is_applied_as_a_value() {
    let source = r#"
sub := fn a b -> a - b
print (10 |> sub 1)
print (10 |> (sub 1))
print ((sub 1) 10)
"#;
    expect_output(source, "9\n-9\n-9\n");
}

#[test]
fn static_errors() {
    for (source, kind) in [
        ("x := \"open", ErrorKind::Lex),
        ("a\n    b", ErrorKind::Indent),
        ("f :=", ErrorKind::Parse),
    ] {
        let err = expect_error(source, kind);
        assert!(err.kind.is_static());
    }
}

#[test]
fn invalid_character_is_reported_before_layout() {
    let err = expect_error("a @\n    b", ErrorKind::Lex);
    assert_eq!((err.position.line, err.position.column), (1, 3));
}

#[test]
fn nothing_is_printed_when_parsing_fails() {
    let (result, output) = run_program("print 1\nprint (");
    assert!(result.is_err());
    assert_eq!(output, "");
}
