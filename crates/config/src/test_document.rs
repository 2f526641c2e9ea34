#[cfg(test)]
mod tests {
    use std::{
        env, fs,
        path::PathBuf,
        process,
        time::{SystemTime, UNIX_EPOCH},
    };

    use crate::*;

    fn unique_tmp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let mut dir = env::temp_dir();
        dir.push(format!("ribbon-{name}-{}-{nanos}", process::id()));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn full_document_parses() {
        let src = r#"
            # bar configuration
            define Sep = " | "
            define Fmt = "%H:%M"

            layout "top" {
              align = Center
              label "clock" {
                id = "clock"
                value = time(Fmt) + Sep
                tooltip = "Now: " + time()
                interval = 1000
                style = "clock"
                loc(1, 0)
              }
              scale {
                value = "disk", disk("/", "%used") / 100
                disable = false
                loc(2, 0, 3)
              };
            }
        "#;
        let doc = load_from_str(src, None).unwrap();
        assert_eq!(doc.macros.len(), 2);
        assert_eq!(doc.blocks.len(), 1);

        let top = &doc.blocks[0];
        assert_eq!(top.kind, BlockKind::Layout);
        assert_eq!(top.name.as_deref(), Some("top"));
        assert_eq!(top.align, Some(Align::Center));
        assert_eq!(top.children.len(), 2);

        let clock = &top.children[0];
        assert_eq!(clock.kind, BlockKind::Label);
        assert_eq!(clock.id.as_deref(), Some("clock"));
        assert_eq!(clock.value.as_deref(), Some(r#"time("%H:%M")+" | ""#));
        assert_eq!(clock.tooltip.as_deref(), Some(r#""Now: "+time()"#));
        assert_eq!(clock.interval, Some(1000.0));
        assert_eq!(clock.style.as_deref(), Some("clock"));
        assert_eq!(
            clock.loc,
            Some(Loc {
                x: 1,
                y: 0,
                w: 1,
                h: 1
            })
        );

        let scale = &top.children[1];
        assert_eq!(scale.value_label.as_deref(), Some("disk"));
        assert_eq!(scale.value.as_deref(), Some(r#"disk("/","%used")/100"#));
        assert!(!scale.disable);
        assert_eq!(scale.loc.map(|l| (l.w, l.h)), Some((3, 1)));

        assert_eq!(doc.all_blocks().len(), 3);
    }

    #[test]
    fn redefinition_does_not_touch_parsed_values() {
        let src = r#"
            define Icon = "a"
            label { value = Icon }
            define Icon = "b"
            label { value = Icon }
        "#;
        let doc = load_from_str(src, None).unwrap();
        assert_eq!(doc.blocks[0].value.as_deref(), Some(r#""a""#));
        assert_eq!(doc.blocks[1].value.as_deref(), Some(r#""b""#));
        assert_eq!(doc.macros.get("Icon"), Some(r#""b""#));

        // A fresh parse seeded with the final table sees the newest definition.
        let again = load_with_macros("label { value = Icon }", None, doc.macros.clone()).unwrap();
        assert_eq!(again.blocks[0].value.as_deref(), Some(r#""b""#));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let doc = load_from_str("LABEL { VALUE = 1 Interval = 5 }", None).unwrap();
        assert_eq!(doc.blocks[0].value.as_deref(), Some("1"));
        assert_eq!(doc.blocks[0].interval, Some(5.0));
    }

    #[test]
    fn value_stops_at_next_property() {
        let doc = load_from_str("label { value = 1 + 2 style = \"x\" }", None).unwrap();
        assert_eq!(doc.blocks[0].value.as_deref(), Some("1+2"));
        assert_eq!(doc.blocks[0].style.as_deref(), Some("x"));
    }

    #[test]
    fn missing_brace_is_fatal() {
        let err = load_from_str("label \"x\" value = 1", None).unwrap_err();
        assert_eq!(err.message(), "missing '{' after 'label'");
        match err {
            Error::Parse { line, col, .. } => assert_eq!((line, col), (1, 11)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn bad_align_reports_choices() {
        let err = load_from_str("label { align = middle }", None).unwrap_err();
        assert_eq!(
            err.message(),
            "invalid value in align = left|right|center|fill"
        );
    }

    #[test]
    fn unexpected_tokens_are_named() {
        let err = load_from_str("clock { }", None).unwrap_err();
        assert_eq!(err.message(), "unexpected identifier 'clock' at top level");

        let err = load_from_str("label { 42 }", None).unwrap_err();
        assert_eq!(err.message(), "unexpected number 42 in label block");
    }

    #[test]
    fn unterminated_block_ends_at_eof() {
        let doc = load_from_str("layout { label { value = 1", None).unwrap();
        assert_eq!(doc.blocks[0].children[0].value.as_deref(), Some("1"));
    }

    #[test]
    fn block_nesting_is_bounded() {
        let nested = |levels: usize| "layout { ".repeat(levels) + &"}".repeat(levels);

        let doc = load_from_str(&nested(MAX_BLOCK_DEPTH), None).unwrap();
        assert_eq!(doc.all_blocks().len(), MAX_BLOCK_DEPTH);

        let err = load_from_str(&nested(200_000), None).unwrap_err();
        assert_eq!(
            err.message(),
            format!("blocks nested deeper than {MAX_BLOCK_DEPTH} levels")
        );
    }

    #[test]
    fn load_from_path_records_config_dir() {
        let dir = unique_tmp_dir("load");
        let path = dir.join("config");
        fs::write(&path, "define A = 1\nlabel { value = A }\n").unwrap();
        let doc = load_from_path(&path).unwrap();
        assert_eq!(doc.config_dir.as_deref(), Some(dir.as_path()));
        assert_eq!(doc.blocks[0].value.as_deref(), Some("1"));

        let err = load_from_path(&dir.join("missing")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
        assert!(err.path().is_some());
        let _ignored = fs::remove_dir_all(&dir);
    }

    #[test]
    fn parse_error_carries_path() {
        let dir = unique_tmp_dir("err");
        let path = dir.join("config");
        fs::write(&path, "define = 1\n").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert_eq!(err.path(), Some(path.as_path()));
        assert!(err.pretty().contains("missing identifier after 'define'"));
        let _ignored = fs::remove_dir_all(&dir);
    }

    #[test]
    fn document_serializes_to_json() {
        let doc = load_from_str("define A = 1\nbutton \"b\" { align = fill }", None).unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["macros"]["A"], "1");
        assert_eq!(json["blocks"][0]["kind"], "button");
        assert_eq!(json["blocks"][0]["align"], "fill");
    }
}
