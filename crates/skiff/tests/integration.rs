//! Integration tests - Full runtime from binding to navigation
//!
//! Exercises the complete workflow: HTML → bind → scan → message
//! routing → fetch-and-swap navigation.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use skiff::{
    App, Command, ControllerSpec, HandlerError, HashHistory, Msg, NavError, NavPhase,
    RawResponse, TAG_CLASS,
};

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

fn taken(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

#[derive(Default)]
struct Plain;

fn app(body: &str) -> App {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let html = format!("<html><head><title>start</title></head><body>{body}</body></html>");
    App::from_html(&html, "http://example.com/").unwrap()
}

// ============================================================================
// BINDING AND SCAN
// ============================================================================

#[test]
fn test_scan_is_idempotent() {
    let mut app = app("<div class=\"c\" id=\"one\"></div><div class=\"c\" id=\"two\"></div>");
    let log = log();
    let l = log.clone();
    let spec = ControllerSpec::build::<Plain>()
        .init(move |_, _, _| {
            push(&l, "init");
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".c", spec).unwrap();
    app.start();
    app.scan();
    app.scan();
    assert_eq!(taken(&log), vec!["init", "init"]);
}

#[test]
fn test_init_runs_before_any_mount() {
    let mut app = app("<div class=\"c\" id=\"one\"></div><div class=\"c\" id=\"two\"></div>");
    let log = log();
    let (li, lm) = (log.clone(), log.clone());
    let spec = ControllerSpec::build::<Plain>()
        .init(move |_, cx, _| {
            push(&li, format!("init {}", cx.el().to_raw()));
            Ok(())
        })
        .mount(move |_, cx, _| {
            push(&lm, format!("mount {}", cx.el().to_raw()));
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".c", spec).unwrap();
    app.start();
    let entries = taken(&log);
    assert_eq!(entries.len(), 4);
    assert!(entries[0].starts_with("init"));
    assert!(entries[1].starts_with("init"));
    assert!(entries[2].starts_with("mount"));
    assert!(entries[3].starts_with("mount"));
}

#[test]
fn test_bind_after_start_applies_immediately() {
    let mut app = app("<div class=\"late\"></div>");
    app.start();
    let log = log();
    let l = log.clone();
    let spec = ControllerSpec::build::<Plain>()
        .init(move |_, _, _| {
            push(&l, "init");
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".late", spec).unwrap();
    assert_eq!(taken(&log), vec!["init"]);
}

#[test]
fn test_bind_from_inside_init_is_safe() {
    let mut app = app("<div class=\"outer\"></div><div class=\"extra\"></div>");
    let log = log();
    let (lo, le) = (log.clone(), log.clone());
    let outer = ControllerSpec::build::<Plain>()
        .init(move |_, cx, _| {
            push(&lo, "outer init");
            let le = le.clone();
            let extra = ControllerSpec::build::<Plain>()
                .init(move |_, _, _| {
                    push(&le, "extra init");
                    Ok(())
                })
                .finish()
                .map_err(|e| HandlerError::new(e.to_string()))?;
            cx.app()
                .bind(".extra", extra)
                .map_err(|e| HandlerError::new(e.to_string()))?;
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".outer", outer).unwrap();
    app.start();
    assert_eq!(taken(&log), vec!["outer init", "extra init"]);

    // Neither controller runs init again on a later pass.
    app.scan();
    assert!(taken(&log).is_empty());
}

#[test]
fn test_tagged_element_carries_marker_class() {
    let mut app = app("<div class=\"c\" id=\"one\"></div>");
    app.bind(".c", ControllerSpec::build::<Plain>().finish().unwrap())
        .unwrap();
    app.start();
    let el = app.doc().get_element_by_id("one").unwrap();
    assert!(app.doc().tree().has_class(el, TAG_CLASS));
}

#[test]
fn test_invalid_selector_fails_fast() {
    let mut app = app("");
    let err = app.bind(".[", ControllerSpec::build::<Plain>().finish().unwrap());
    assert!(err.is_err());
}

#[test]
fn test_state_persists_across_deliveries() {
    #[derive(Default)]
    struct Counter {
        hits: u32,
    }
    let mut app = app("<div class=\"c\"></div>");
    let log = log();
    let l = log.clone();
    let spec = ControllerSpec::build::<Counter>()
        .sub("tick", move |state, _, _| {
            state.hits += 1;
            push(&l, format!("hits {}", state.hits));
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".c", spec).unwrap();
    app.start();
    app.publish("tick", vec![]);
    app.publish("tick", vec![]);
    assert_eq!(taken(&log), vec!["hits 1", "hits 2"]);
}

// ============================================================================
// PUBLISH / SUBSCRIBE
// ============================================================================

#[test]
fn test_publish_document_order_and_envelope() {
    let mut app = app(
        "<div class=\"foo\" id=\"pub\"></div>\
         <div class=\"sub\" id=\"a\"></div>\
         <div class=\"sub\" id=\"b\"></div>",
    );
    let log = log();

    let l = log.clone();
    let publisher = ControllerSpec::build::<Plain>()
        .event("click", move |_, cx, _| {
            cx.publish("ping", vec![json!(42)]);
            Ok(())
        })
        .sub("ping", move |_, _, msg| {
            push(&l, format!("self {}", msg.arg(0).unwrap()));
            Ok(())
        })
        .finish()
        .unwrap();

    let l = log.clone();
    let subscriber = ControllerSpec::build::<Plain>()
        .sub("ping", move |_, cx, msg: &Msg| {
            let from = msg.source.map(|s| s.el.to_raw());
            push(
                &l,
                format!(
                    "{} got {} from {:?}",
                    cx.doc().tree().attr(cx.el(), "id").unwrap(),
                    msg.arg(0).unwrap(),
                    from
                ),
            );
            Ok(())
        })
        .finish()
        .unwrap();

    app.bind(".foo", publisher).unwrap();
    app.bind(".sub", subscriber).unwrap();
    app.start();

    let pub_el = app.doc().get_element_by_id("pub").unwrap();
    app.dispatch_event(pub_el, "click", vec![]);

    let entries = taken(&log);
    // Document order: a before b; publisher's own subscription is
    // queued while its click handler runs and drains afterwards.
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0], format!("a got 42 from Some({})", pub_el.to_raw()));
    assert_eq!(entries[1], format!("b got 42 from Some({})", pub_el.to_raw()));
    assert_eq!(entries[2], "self 42");
}

#[test]
fn test_publish_without_subscribers_is_a_noop() {
    let mut app = app("<div class=\"c\"></div>");
    app.bind(".c", ControllerSpec::build::<Plain>().finish().unwrap())
        .unwrap();
    app.start();
    app.publish("nobody-listens", vec![json!(1)]);
    assert!(app.take_failures().is_empty());
}

#[test]
fn test_nested_publish_completes_before_outer_returns() {
    let mut app = app(
        "<div class=\"relay\"></div><div class=\"rec\"></div><div class=\"tail\"></div>",
    );
    let log = log();

    let l = log.clone();
    let relay = ControllerSpec::build::<Plain>()
        .sub("first", move |_, cx, _| {
            push(&l, "relay first");
            cx.publish("second", vec![]);
            push(&l, "relay resumed");
            Ok(())
        })
        .finish()
        .unwrap();

    let l = log.clone();
    let rec = ControllerSpec::build::<Plain>()
        .sub("second", move |_, _, _| {
            push(&l, "rec second");
            Ok(())
        })
        .finish()
        .unwrap();

    let l = log.clone();
    let tail = ControllerSpec::build::<Plain>()
        .sub("first", move |_, _, _| {
            push(&l, "tail first");
            Ok(())
        })
        .finish()
        .unwrap();

    app.bind(".relay", relay).unwrap();
    app.bind(".rec", rec).unwrap();
    app.bind(".tail", tail).unwrap();
    app.start();

    app.publish("first", vec![]);
    // The inner publish delivers in full before the relay's handler
    // returns, and before "first" reaches the remaining subscriber.
    assert_eq!(
        taken(&log),
        vec!["relay first", "rec second", "relay resumed", "tail first"]
    );
}

#[test]
fn test_handler_failure_is_isolated() {
    let mut app = app("<div class=\"c\" id=\"a\"></div><div class=\"c\" id=\"b\"></div>");
    let log = log();
    let l = log.clone();
    let spec = ControllerSpec::build::<Plain>()
        .sub("ping", move |_, cx, _| {
            let id = cx.doc().tree().attr(cx.el(), "id").unwrap().to_string();
            push(&l, id.clone());
            if id == "a" {
                return Err(HandlerError::new("boom"));
            }
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".c", spec).unwrap();
    app.start();
    app.publish("ping", vec![]);

    assert_eq!(taken(&log), vec!["a", "b"]);
    let failures = app.take_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, "ping");
    assert_eq!(failures[0].error.message, "boom");
}

#[test]
fn test_multiple_handlers_per_message_name() {
    let mut app = app("<div class=\"c\"></div>");
    let log = log();
    let (l1, l2) = (log.clone(), log.clone());
    let spec = ControllerSpec::build::<Plain>()
        .sub("ping", move |_, _, _| {
            push(&l1, "first");
            Ok(())
        })
        .sub("ping", move |_, _, _| {
            push(&l2, "second");
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".c", spec).unwrap();
    app.start();
    app.publish("ping", vec![]);
    assert_eq!(taken(&log), vec!["first", "second"]);
}

// ============================================================================
// TREE MESSAGING (UP / DOWN)
// ============================================================================

#[test]
fn test_up_reaches_ancestors_nearest_first() {
    let mut app = app(
        "<div class=\"outer\"><div class=\"mid\"><div class=\"inner\" id=\"leaf\"></div></div></div>\
         <div class=\"outer\" id=\"unrelated\"></div>",
    );
    let log = log();

    let l = log.clone();
    let outer = ControllerSpec::build::<Plain>()
        .below("note", move |_, _, msg| {
            let word = msg.arg(0).and_then(|v| v.as_str()).unwrap_or("");
            push(&l, format!("outer heard {word}"));
            Ok(())
        })
        .finish()
        .unwrap();

    let l = log.clone();
    let mid = ControllerSpec::build::<Plain>()
        .below("note", move |_, _, _| {
            push(&l, "mid heard");
            Ok(())
        })
        .finish()
        .unwrap();

    let inner = ControllerSpec::build::<Plain>()
        .event("poke", |_, cx, _| {
            cx.up("note", vec![json!("hi")]);
            Ok(())
        })
        .finish()
        .unwrap();

    app.bind(".outer", outer).unwrap();
    app.bind(".mid", mid).unwrap();
    app.bind(".inner", inner).unwrap();
    app.start();

    let leaf = app.doc().get_element_by_id("leaf").unwrap();
    app.dispatch_event(leaf, "poke", vec![]);

    assert_eq!(taken(&log), vec!["mid heard", "outer heard hi"]);
}

#[test]
fn test_down_reaches_descendants_only() {
    let mut app = app(
        "<div class=\"root\" id=\"r\"><div class=\"kid\" id=\"k1\"></div>\
         <div><div class=\"kid\" id=\"k2\"></div></div></div>\
         <div class=\"kid\" id=\"outside\"></div>",
    );
    let log = log();

    let root = ControllerSpec::build::<Plain>()
        .event("poke", |_, cx, _| {
            cx.down("note", vec![]);
            Ok(())
        })
        .finish()
        .unwrap();

    let l = log.clone();
    let kid = ControllerSpec::build::<Plain>()
        .above("note", move |_, cx, _| {
            push(&l, cx.doc().tree().attr(cx.el(), "id").unwrap());
            Ok(())
        })
        .finish()
        .unwrap();

    app.bind(".root", root).unwrap();
    app.bind(".kid", kid).unwrap();
    app.start();

    let r = app.doc().get_element_by_id("r").unwrap();
    app.dispatch_event(r, "poke", vec![]);
    assert_eq!(taken(&log), vec!["k1", "k2"]);
}

// ============================================================================
// DOM EVENT DISPATCH
// ============================================================================

#[test]
fn test_event_delegation_scoped_to_bound_element() {
    let mut app = app(
        "<div class=\"list\" id=\"list\"><ul><li class=\"item\" id=\"li1\">x</li></ul></div>\
         <span class=\"item\" id=\"stray\"></span>",
    );
    let log = log();
    let l = log.clone();
    let spec = ControllerSpec::build::<Plain>()
        .event("click .item", move |_, _, _| {
            push(&l, "delegated");
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".list", spec).unwrap();
    app.start();

    // Click inside the list on a matching element: fires.
    let li = app.doc().get_element_by_id("li1").unwrap();
    app.dispatch_event(li, "click", vec![]);
    assert_eq!(taken(&log), vec!["delegated"]);

    // Click on the bound element itself: no descendant matched.
    let list = app.doc().get_element_by_id("list").unwrap();
    app.dispatch_event(list, "click", vec![]);
    assert!(taken(&log).is_empty());

    // Click outside the list: out of scope.
    let stray = app.doc().get_element_by_id("stray").unwrap();
    app.dispatch_event(stray, "click", vec![]);
    assert!(taken(&log).is_empty());
}

#[test]
fn test_direct_event_fires_on_bubble() {
    let mut app = app("<div class=\"box\"><p id=\"inner\">text</p></div>");
    let log = log();
    let l = log.clone();
    let spec = ControllerSpec::build::<Plain>()
        .event("click", move |_, _, _| {
            push(&l, "clicked");
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".box", spec).unwrap();
    app.start();
    let inner = app.doc().get_element_by_id("inner").unwrap();
    app.dispatch_event(inner, "click", vec![]);
    assert_eq!(taken(&log), vec!["clicked"]);
}

#[test]
fn test_rescan_picks_up_inserted_markup() {
    let mut app = app("<div class=\"host\" id=\"host\"></div>");
    let log = log();

    let host = ControllerSpec::build::<Plain>()
        .event("fill", |_, cx, _| {
            let el = cx.el();
            let tree = cx.doc_mut().tree_mut();
            let child = tree.create_element("div");
            tree.add_class(child, "widget");
            tree.append_child(el, child);
            cx.rescan();
            Ok(())
        })
        .finish()
        .unwrap();

    let l = log.clone();
    let widget = ControllerSpec::build::<Plain>()
        .init(move |_, _, _| {
            push(&l, "widget init");
            Ok(())
        })
        .finish()
        .unwrap();

    app.bind(".host", host).unwrap();
    app.bind(".widget", widget).unwrap();
    app.start();

    let host_el = app.doc().get_element_by_id("host").unwrap();
    app.dispatch_event(host_el, "fill", vec![]);
    assert_eq!(taken(&log), vec!["widget init"]);
}

// ============================================================================
// NAVIGATION
// ============================================================================

fn page(title: &str, body: &str) -> RawResponse {
    RawResponse {
        status: 200,
        body: format!("<html><head><title>{title}</title></head><body>{body}</body></html>"),
    }
}

#[test]
fn test_navigation_swaps_body_and_title() {
    let mut app = app("<p id=\"old\">old</p>");
    app.start();
    app.take_commands();

    let id = app.navigate("/next").unwrap();
    let commands = app.take_commands();
    assert!(matches!(commands[0], Command::FetchDocument { .. }));

    app.finish_fetch(id, Ok(page("next page", "<p id=\"new\">new</p>")));
    assert_eq!(app.doc().title(), "next page");
    assert!(app.doc().get_element_by_id("old").is_none());
    assert!(app.doc().get_element_by_id("new").is_some());
    assert_eq!(app.base_url().as_str(), "http://example.com/next");
    assert_eq!(
        app.address().unwrap().as_str(),
        "http://example.com/next"
    );
    assert!(app.take_commands().contains(&Command::ScrollToTop));
}

#[test]
fn test_navigation_rescans_new_content() {
    let mut app = app("");
    let log = log();
    let l = log.clone();
    let spec = ControllerSpec::build::<Plain>()
        .init(move |_, _, _| {
            push(&l, "init");
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".c", spec).unwrap();
    app.start();
    assert!(taken(&log).is_empty());

    let id = app.navigate("/two").unwrap();
    app.finish_fetch(id, Ok(page("two", "<div class=\"c\"></div>")));
    assert_eq!(taken(&log), vec!["init"]);
}

#[test]
fn test_http_error_leaves_document_untouched() {
    let mut app = app("<p id=\"keep\">kept</p>");
    app.start();
    let before = skiff::serialize(app.doc().tree(), skiff::NodeId::ROOT);

    let result = Rc::new(RefCell::new(None));
    let r = result.clone();
    let id = app
        .navigate_with(
            "/missing",
            Default::default(),
            Some(Box::new(move |_, outcome| {
                *r.borrow_mut() = Some(outcome);
            })),
        )
        .unwrap();
    app.finish_fetch(
        id,
        Ok(RawResponse {
            status: 404,
            body: "<html><body>not found</body></html>".into(),
        }),
    );

    assert!(matches!(
        result.borrow_mut().take(),
        Some(Err(NavError::HttpStatus(404)))
    ));
    assert!(app.doc().get_element_by_id("keep").is_some());
    assert_eq!(app.base_url().as_str(), "http://example.com/");
    let after = skiff::serialize(app.doc().tree(), skiff::NodeId::ROOT);
    assert_eq!(before, after);
}

#[test]
fn test_unparseable_response_leaves_document_untouched() {
    let mut app = app("<p id=\"keep\">kept</p>");
    app.start();
    let result = Rc::new(RefCell::new(None));
    let r = result.clone();
    let id = app
        .navigate_with(
            "/broken",
            Default::default(),
            Some(Box::new(move |_, outcome| {
                *r.borrow_mut() = Some(outcome);
            })),
        )
        .unwrap();
    app.finish_fetch(
        id,
        Ok(RawResponse {
            status: 200,
            body: String::new(),
        }),
    );
    assert!(matches!(
        result.borrow_mut().take(),
        Some(Err(NavError::Parse(_)))
    ));
    assert!(app.doc().get_element_by_id("keep").is_some());
}

#[test]
fn test_request_failure_reported_through_callback() {
    let mut app = app("");
    app.start();
    let result = Rc::new(RefCell::new(None));
    let r = result.clone();
    let id = app
        .navigate_with(
            "/x",
            Default::default(),
            Some(Box::new(move |_, outcome| {
                *r.borrow_mut() = Some(outcome);
            })),
        )
        .unwrap();
    app.finish_fetch(id, Err("connection reset".into()));
    assert!(matches!(
        result.borrow_mut().take(),
        Some(Err(NavError::Request(_)))
    ));
}

#[test]
fn test_failed_navigation_passes_through_error_phase() {
    let mut app = app("");
    app.start();
    let seen = Rc::new(RefCell::new(None));
    let s = seen.clone();
    let id = app
        .navigate_with(
            "/x",
            Default::default(),
            Some(Box::new(move |app: &mut App, _| {
                *s.borrow_mut() = Some(app.nav_phase());
            })),
        )
        .unwrap();
    assert_eq!(app.nav_phase(), NavPhase::Fetching);
    app.finish_fetch(id, Err("connection reset".into()));
    // The callback observes the error phase; afterwards the runtime is
    // back at rest.
    assert_eq!(seen.borrow_mut().take(), Some(NavPhase::Error));
    assert_eq!(app.nav_phase(), NavPhase::Idle);
}

#[test]
fn test_newer_navigation_supersedes_older() {
    let mut app = app("<p id=\"start\"></p>");
    app.start();

    let first = app.navigate("/a").unwrap();
    let second = app.navigate("/b").unwrap();

    // Stale completion is dropped without touching the document.
    app.finish_fetch(first, Ok(page("a", "<p id=\"a\"></p>")));
    assert!(app.doc().get_element_by_id("a").is_none());
    assert!(app.doc().get_element_by_id("start").is_some());

    app.finish_fetch(second, Ok(page("b", "<p id=\"b\"></p>")));
    assert!(app.doc().get_element_by_id("b").is_some());
    assert_eq!(app.doc().title(), "b");
}

#[test]
fn test_autofocus_and_scroll_suppression() {
    let mut app = app("");
    app.start();
    app.take_commands();

    let id = app
        .navigate_with(
            "/form",
            skiff::NavigateOptions {
                no_scroll_to_top: true,
            },
            None,
        )
        .unwrap();
    app.take_commands();
    app.finish_fetch(id, Ok(page("form", "<input autofocus>")));

    let commands = app.take_commands();
    assert!(commands.iter().any(|c| matches!(c, Command::Focus { .. })));
    assert!(!commands.contains(&Command::ScrollToTop));
}

#[test]
fn test_script_dedup_across_navigations() {
    let mut app = App::from_html(
        "<html><head><script src=\"/app.js\"></script></head><body></body></html>",
        "http://example.com/",
    )
    .unwrap();
    app.start();
    app.take_commands();

    let id = app.navigate("/two").unwrap();
    app.take_commands();
    app.finish_fetch(
        id,
        Ok(RawResponse {
            status: 200,
            body: "<html><head><script src=\"/app.js\"></script>\
                   <script src=\"/page2.js\"></script></head><body></body></html>"
                .into(),
        }),
    );
    let scripts: Vec<Command> = app
        .take_commands()
        .into_iter()
        .filter(|c| matches!(c, Command::LoadScript { .. }))
        .collect();
    assert_eq!(
        scripts,
        vec![Command::LoadScript {
            url: "/page2.js".into()
        }]
    );

    // A third page repeating page2.js schedules nothing.
    let id = app.navigate("/three").unwrap();
    app.take_commands();
    app.finish_fetch(
        id,
        Ok(RawResponse {
            status: 200,
            body: "<html><head><script src=\"/page2.js\"></script></head><body></body></html>"
                .into(),
        }),
    );
    assert!(app
        .take_commands()
        .iter()
        .all(|c| !matches!(c, Command::LoadScript { .. })));
}

// ============================================================================
// HISTORY AND REVISITS
// ============================================================================

#[test]
fn test_go_back_refetches_and_emits_revisit_events() {
    let mut app = app("<p>one</p>");
    app.start();

    let id = app.navigate("/two").unwrap();
    app.finish_fetch(id, Ok(page("two", "<p>two</p>")));
    assert_eq!(app.address().unwrap().as_str(), "http://example.com/two");

    let log = log();
    let (ls, le) = (log.clone(), log.clone());
    app.on("revisit-start", move |args| {
        push(&ls, format!("start {}", args[0].as_str().unwrap()));
    });
    app.on("revisit-end", move |args| {
        push(&le, format!("end {}", args[0].as_str().unwrap()));
    });

    let id = app.go_back().unwrap();
    assert_eq!(taken(&log), vec!["start http://example.com/"]);
    app.finish_fetch(id, Ok(page("one", "<p>one</p>")));
    assert_eq!(taken(&log), vec!["end http://example.com/"]);
    assert_eq!(app.address().unwrap().as_str(), "http://example.com/");
    assert_eq!(app.doc().title(), "one");
}

#[test]
fn test_pop_before_start_is_ignored() {
    let mut app = app("");
    assert!(app.on_pop("http://example.com/elsewhere").unwrap().is_none());
    app.start();
    assert!(app.on_pop("http://example.com/elsewhere").unwrap().is_some());
}

#[test]
fn test_hash_history_pop_fetches_decoded_url() {
    let base = url::Url::parse("http://example.com/app").unwrap();
    let mut app = App::from_html(
        "<html><head><title>start</title></head><body></body></html>",
        "http://example.com/app",
    )
    .unwrap()
    .with_history(HashHistory::new(base.clone()));
    app.start();

    let id = app.navigate("/items").unwrap();
    app.finish_fetch(id, Ok(page("items", "<p>items</p>")));
    assert_eq!(
        app.address().unwrap().as_str(),
        "http://example.com/app#/items"
    );
    app.take_commands();

    // The host reports the fragment-bearing address; the revisit must
    // fetch the real url the fragment encodes, not the address itself.
    let id = app.on_pop("http://example.com/app#/app").unwrap().unwrap();
    let commands = app.take_commands();
    assert_eq!(commands[0], Command::FetchDocument { id, url: base });
    assert_eq!(
        app.address().unwrap().as_str(),
        "http://example.com/app#/app"
    );
}

#[test]
fn test_go_back_with_empty_history() {
    let mut app = app("");
    app.start();
    assert!(app.go_back().is_none());
}

#[test]
fn test_body_change_event_carries_node_ids() {
    let mut app = app("");
    app.start();
    let log = log();
    let l = log.clone();
    app.on("body-change", move |args| {
        push(&l, format!("{} -> {}", args[0], args[1]));
    });
    let id = app.navigate("/two").unwrap();
    app.finish_fetch(id, Ok(page("two", "<p>two</p>")));
    assert_eq!(log.borrow().len(), 1);
}

// ============================================================================
// EMITTER
// ============================================================================

#[test]
fn test_emitter_on_once_off() {
    let mut app = app("");
    let log = log();
    let (l1, l2) = (log.clone(), log.clone());
    let persistent = app.on("tick", move |_| push(&l1, "on"));
    app.once("tick", move |_| push(&l2, "once"));

    app.emit("tick", &[]);
    app.emit("tick", &[]);
    assert_eq!(taken(&log), vec!["on", "once", "on"]);

    app.off("tick", persistent);
    app.emit("tick", &[]);
    assert!(taken(&log).is_empty());
}

// ============================================================================
// SWEEP / UNMOUNT
// ============================================================================

#[test]
fn test_sweep_unmounts_detached_controllers() {
    let mut app = app("<div class=\"c\" id=\"gone\"></div>");
    let log = log();
    let l = log.clone();
    let spec = ControllerSpec::build::<Plain>()
        .unmount(move |_, _, _| {
            push(&l, "unmount");
            Ok(())
        })
        .finish()
        .unwrap();
    app.bind(".c", spec).unwrap();
    app.start();

    // Still attached: sweep is a no-op.
    app.sweep();
    assert!(taken(&log).is_empty());

    let id = app.navigate("/two").unwrap();
    app.finish_fetch(id, Ok(page("two", "<p>fresh</p>")));
    app.sweep();
    assert_eq!(taken(&log), vec!["unmount"]);

    // Second sweep finds nothing.
    app.sweep();
    assert!(taken(&log).is_empty());
}
