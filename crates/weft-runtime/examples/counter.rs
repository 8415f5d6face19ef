//! Counter component demo
//!
//! Defines a `demo-counter` component, connects one, dispatches a few
//! click events at it, and prints the rendered tree after each pass.
//!
//! Run with: cargo run --example counter

use anyhow::Result;
use weft_runtime::{
    h, Child, Component, ComponentError, ComponentSpec, Event, Runtime, VAttrs, VNode,
};

struct Counter {
    count: i64,
}

impl Component for Counter {
    fn render(&mut self) -> Result<Vec<VNode>, ComponentError> {
        Ok(vec![
            h(
                "p",
                VAttrs::new().class_if("warning", self.count > 2),
                vec![Child::from("count: "), Child::from(self.count)],
            ),
            h("button", VAttrs::new().attr("id", "inc"), vec![Child::from("+1")]),
        ])
    }

    fn handle_event(&mut self, method: &str, _event: &Event) -> Result<(), ComponentError> {
        match method {
            "increment" => {
                self.count += 1;
                Ok(())
            }
            other => Err(ComponentError::UnknownMethod(other.to_string())),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut rt = Runtime::new();
    rt.define_component(
        ComponentSpec::new("demo-counter", || Counter { count: 0 })
            .with_listener("click", "increment"),
    )?;

    let host = rt.dom_mut().create_element("demo-counter");
    let doc = rt.dom().document();
    rt.dom_mut().append_child(doc, host);
    rt.connect_element(host);
    rt.pump();

    println!("initial: {}", rt.dom().outer_html(host));

    for _ in 0..4 {
        rt.dispatch_host_event(host, &Event::new("click"));
        rt.request_update(host);
        rt.pump();
        println!("after click: {}", rt.dom().outer_html(host));
    }

    Ok(())
}
