use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use lineparser::{
    Error, LineParser, MatchConfig, MatchResult, Metadata, MetadataError, ParamValue, Scalar,
};

type Calls = Rc<RefCell<Vec<(String, MatchResult)>>>;

fn repo_root() -> &'static Path {
    // crates/lineparser -> crates -> <repo root>
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("unexpected CARGO_MANIFEST_DIR layout")
}

fn adb_meta() -> Metadata {
    Metadata::from_file(&repo_root().join("testdata/adb.json")).expect("failed to load adb.json")
}

const HANDLERS: [&str; 8] = [
    "connect",
    "disconnect",
    "shell",
    "push",
    "pull",
    "install",
    "uninstall",
    "help",
];

fn recording_parser(meta: Metadata, config: MatchConfig) -> (LineParser, Calls) {
    let calls: Calls = Rc::new(RefCell::new(Vec::new()));
    let mut builder = LineParser::builder(meta).config(config);
    for name in HANDLERS {
        let calls = calls.clone();
        builder = builder.handler(name, move |inv| {
            calls
                .borrow_mut()
                .push((inv.handler.to_string(), inv.result.clone()));
            Ok(())
        });
    }
    (builder.build().expect("adb metadata is valid"), calls)
}

fn adb() -> (LineParser, Calls) {
    recording_parser(adb_meta(), MatchConfig::default())
}

#[test]
fn connect_fills_default_port_and_calls_handler_once() {
    let (parser, calls) = adb();
    let ran = parser
        .parse(&["connect", "--host", "10.0.0.1"], None)
        .unwrap();
    assert_eq!(ran, Some(0));

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    let (handler, r) = &calls[0];
    assert_eq!(handler, "connect");
    assert!(r.matched);
    assert_eq!(r.subcommand.as_deref(), Some("connect"));
    assert_eq!(r.param_str("host"), Some("10.0.0.1"));
    assert_eq!(r.param("port"), Some(&ParamValue::Single(Scalar::Int(5037))));
    assert_eq!(r.param("p"), Some(&ParamValue::Single(Scalar::Int(5037))));
}

#[test]
fn localhost_flag_selects_second_usage() {
    let (parser, calls) = adb();
    let ran = parser.parse(&["connect", "--localhost"], None).unwrap();
    assert_eq!(ran, Some(1));
    let calls = calls.borrow();
    assert!(calls[0].1.flag("l"));
    assert!(calls[0].1.flag("localhost"));
}

#[test]
fn first_declared_usage_wins() {
    // Both connect usages accept this line; only the first fires.
    let (parser, calls) = adb();
    let ran = parser
        .parse(&["connect", "--host", "h", "-l"], None)
        .unwrap();
    assert_eq!(ran, Some(0));
    assert_eq!(calls.borrow().len(), 1);

    let mut meta = adb_meta();
    meta.usages.swap(0, 1);
    let (parser, calls) = recording_parser(meta, MatchConfig::default());
    let ran = parser
        .parse(&["connect", "--host", "h", "-l"], None)
        .unwrap();
    assert_eq!(ran, Some(0));
    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.flag("l"));
}

#[test]
fn repeated_port_becomes_a_list() {
    let (parser, calls) = adb();
    parser
        .parse(&["connect", "--host", "h", "--port", "1", "--port", "2"], None)
        .unwrap();
    let calls = calls.borrow();
    assert_eq!(
        calls[0].1.param("port"),
        Some(&ParamValue::Multiple(vec![Scalar::from("1"), Scalar::from("2")]))
    );
}

#[test]
fn push_keeps_option_shaped_tokens_after_fence() {
    let (parser, calls) = adb();
    let ran = parser
        .parse(&["push", "a.txt", "--dest", "/tmp"], None)
        .unwrap();
    assert_eq!(ran, Some(4));
    let calls = calls.borrow();
    assert_eq!(calls[0].1.args, vec!["a.txt", "--dest", "/tmp"]);
}

#[test]
fn install_requires_reinstall_flag() {
    let (parser, calls) = adb();
    let ran = parser
        .parse(&["install", "-r", "/pkgs/bird.apk"], None)
        .unwrap();
    assert_eq!(ran, Some(6));
    assert_eq!(calls.borrow()[0].1.args, vec!["/pkgs/bird.apk"]);
}

#[test]
fn help_flag_and_catch_all() {
    let (parser, calls) = adb();
    assert_eq!(parser.parse(&["-h"], None).unwrap(), Some(8));
    // Anything else falls through to the trailing catch-all usage.
    assert_eq!(parser.parse(&["--bogus"], None).unwrap(), Some(9));
    let calls = calls.borrow();
    assert!(calls.iter().all(|(h, _)| h == "help"));
    assert_eq!(calls[1].1.unrecognized, vec!["--bogus"]);
}

#[test]
fn no_match_is_silent() {
    let mut meta = adb_meta();
    meta.usages.truncate(2);
    let (parser, calls) = recording_parser(meta, MatchConfig::default());
    assert_eq!(parser.parse(&["disconnect"], None).unwrap(), None);
    assert_eq!(parser.parse(&["connect"], None).unwrap(), None);
    assert!(calls.borrow().is_empty());
}

#[test]
fn strict_mode_skips_usages_with_unknown_options() {
    let (parser, calls) = recording_parser(
        adb_meta(),
        MatchConfig {
            reject_unrecognized: true,
        },
    );
    assert_eq!(parser.parse(&["--host", "h", "--bogus"], None).unwrap(), None);
    assert!(calls.borrow().is_empty());

    // Without strict mode the catch-all takes it.
    let (parser, _) = adb();
    assert_eq!(parser.parse(&["--host", "h", "--bogus"], None).unwrap(), Some(9));
}

#[test]
fn handler_receives_context_and_help() {
    let seen: Rc<RefCell<Option<(u32, String)>>> = Rc::new(RefCell::new(None));
    let mut meta = adb_meta();
    for usage in &mut meta.usages {
        usage.handler = Some("any".to_string());
    }
    let sink = seen.clone();
    let parser = LineParser::<u32>::builder(meta)
        .handler("any", move |inv| {
            let token = inv.context().copied().unwrap_or_default();
            *sink.borrow_mut() = Some((token, inv.help()?));
            Ok(())
        })
        .build()
        .unwrap();

    parser.parse(&["disconnect"], Some(&7)).unwrap();
    let seen = seen.borrow();
    let (token, help) = seen.as_ref().expect("handler should run");
    assert_eq!(*token, 7);
    assert!(help.starts_with("Android Debug Bridge 1.0.3\n"));
}

#[test]
fn handler_errors_propagate() {
    let mut meta = adb_meta();
    for usage in &mut meta.usages {
        usage.handler = Some("fail".to_string());
    }
    let parser = LineParser::<()>::builder(meta)
        .handler("fail", |_| Err("device offline".into()))
        .build()
        .unwrap();

    let err = parser.parse(&["disconnect"], None).unwrap_err();
    match err {
        Error::Handler { usage, source } => {
            assert_eq!(usage, 2);
            assert_eq!(source.to_string(), "device offline");
        }
        other => panic!("expected Handler, got: {other:?}"),
    }
}

#[test]
fn help_has_one_block_per_usage_in_order() {
    let (parser, _) = adb();
    let help = parser.help().unwrap();
    let mut last = 0;
    for (i, usage) in parser.usages().iter().enumerate() {
        let marker = format!(
            "{}. {}\n",
            i + 1,
            usage.description.as_deref().unwrap_or_default()
        );
        let pos = help[last..]
            .find(&marker)
            .unwrap_or_else(|| panic!("missing block {marker:?}"));
        last += pos + marker.len();
    }
    assert!(help.contains("adb connect --host <host> [--port <port>]\n"));
}

#[test]
fn construction_rejects_bad_usages() {
    let mut meta = adb_meta();
    meta.usages.clear();
    assert_eq!(
        LineParser::<()>::builder(meta).build().err(),
        Some(MetadataError::NoUsages)
    );

    let meta = Metadata::from_json_str(r#"{ "program": "adb", "usages": null }"#).unwrap();
    assert_eq!(
        LineParser::<()>::validate(&meta),
        Err(MetadataError::NoUsages)
    );

    let mut meta = adb_meta();
    meta.usages[0].subcommand = Some("reboot".to_string());
    assert!(matches!(
        LineParser::<()>::validate(&meta),
        Err(MetadataError::UndefinedSubcommand { usage: 0, .. })
    ));
}

#[test]
fn construction_rejects_unbound_handlers() {
    let err = LineParser::<()>::builder(adb_meta())
        .handler("connect", |_| Ok(()))
        .build()
        .err();
    assert_eq!(
        err,
        Some(MetadataError::UnboundHandler {
            usage: 2,
            handler: "disconnect".to_string()
        })
    );

    let mut meta = adb_meta();
    meta.usages[0].handler = None;
    assert_eq!(
        LineParser::<()>::builder(meta).build().err(),
        Some(MetadataError::MissingHandler { usage: 0 })
    );
}

#[test]
fn program_defaults_when_absent() {
    let mut meta = adb_meta();
    meta.program = None;
    meta.display_name = None;
    let (parser, _) = recording_parser(meta, MatchConfig::default());
    assert!(!parser.info().program.is_empty());
    assert_eq!(parser.info().display_name, parser.info().program);
}

#[test]
fn explain_reports_every_usage() {
    let (parser, _) = adb();
    let attempts = parser.explain(&["connect", "-l"]);
    assert_eq!(attempts.len(), parser.usages().len());
    let matched: Vec<usize> = attempts
        .iter()
        .enumerate()
        .filter(|(_, r)| r.matched)
        .map(|(i, _)| i)
        .collect();
    // connect -l, plus the catch-all.
    assert_eq!(matched, vec![1, 9]);
}
