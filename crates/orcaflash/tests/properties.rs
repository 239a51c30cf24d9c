use orcaflash::convert;
use orcaflash::dialect::is_layer_annotation;
use proptest::prelude::*;

fn body_line() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just("; CHANGE_LAYER".to_string()),
        4 => "[GM][0-9]{1,3}( [XYZEF][0-9]{1,3}){0,3}",
        2 => "; [a-z ]{0,20}",
        1 => Just(String::new()),
        1 => (0u64..600).prop_map(|minutes| format!("M73 P0 R{minutes}")),
    ]
}

/// A sliced file with a three-line header block, a blank line, then `body`.
fn document(body: &[String], bom: bool, newline: &str) -> String {
    let markers = body.iter().filter(|l| *l == "; CHANGE_LAYER").count();
    let mut lines = vec![
        "; HEADER_BLOCK_START".to_string(),
        format!("; total layer number: {markers}"),
        "; HEADER_BLOCK_END".to_string(),
        String::new(),
        "G28".to_string(),
    ];
    lines.extend(body.iter().cloned());
    lines.push("; filament used [mm] = 1000".to_string());
    lines.push(format!("; total layers count = {markers}"));
    lines.push("; estimated printing time (normal mode) = 50m".to_string());

    let mut text = if bom { "\u{feff}".to_string() } else { String::new() };
    for line in lines {
        text.push_str(&line);
        text.push_str(newline);
    }
    text
}

/// Property: every line outside the header block survives, in order
#[test]
fn proptest_body_lines_preserved() {
    proptest!(|(
        body in prop::collection::vec(body_line(), 0..60),
        bom in any::<bool>(),
        crlf in any::<bool>()
    )| {
        let input = document(&body, bom, if crlf { "\r\n" } else { "\n" });
        let out = convert(&input).unwrap();

        prop_assert_eq!(out.starts_with('\u{feff}'), bom);
        prop_assert_eq!(out.matches("; HEADER_BLOCK_START").count(), 1);

        let expected: Vec<&str> = input.lines().skip(3).collect();
        let actual: Vec<&str> = out
            .lines()
            .skip_while(|l| !l.starts_with("; estimated printing time (seconds)"))
            .skip(1)
            .filter(|l| !is_layer_annotation(l))
            .collect();
        prop_assert_eq!(actual, expected);
    });
}

/// Property: N layer markers give N annotations numbered 1..N
#[test]
fn proptest_layers_numbered_in_order() {
    proptest!(|(body in prop::collection::vec(body_line(), 0..60))| {
        let markers = body.iter().filter(|l| *l == "; CHANGE_LAYER").count();
        let out = convert(&document(&body, false, "\n")).unwrap();

        let numbers: Vec<String> = out
            .lines()
            .filter_map(|l| l.strip_prefix("; layer num/total_layer_count: "))
            .map(str::to_string)
            .collect();
        let expected: Vec<String> = (1..=markers).map(|i| format!("{i}/{markers}")).collect();
        prop_assert_eq!(numbers, expected);
        prop_assert_eq!(
            out.lines().filter(|l| l.starts_with("; print progress: ")).count(),
            markers
        );
    });
}

/// Property: converting converted output changes nothing
#[test]
fn proptest_second_run_is_identity() {
    proptest!(ProptestConfig::with_cases(64), |(
        body in prop::collection::vec(body_line(), 0..40),
        bom in any::<bool>()
    )| {
        let once = convert(&document(&body, bom, "\n")).unwrap();
        let twice = convert(&once).unwrap();
        prop_assert_eq!(twice, once);
    });
}
