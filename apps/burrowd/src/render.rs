use burrowworld::World;
use webwire::Response;

use crate::stats::Chart;

/// Fixed body for `/` and for every unmatched path.
pub fn greeting() -> Response {
    Response::html(
        200,
        "<html><body><h1>Hello world!</h1></body></html>".to_string(),
    )
}

pub fn not_found() -> Response {
    Response::html(404, page("Not found", "<h1>Not found</h1>"))
}

pub fn dwarf_list(w: &World) -> Response {
    let mut s = String::new();
    s.push_str("<h1>Dwarves</h1>\n<table>\n");
    s.push_str("<tr><th>Name</th><th>Hunger</th><th>Sleep</th><th>Whereabouts</th></tr>\n");
    for d in &w.dwarves {
        let loc = w
            .location(d.location)
            .map(|l| l.name.as_str())
            .unwrap_or("parts unknown");
        s.push_str(&format!(
            "<tr><td><a href=\"/entities/{id}\">{name}</a></td><td>{hunger}</td><td>{sleep}</td><td>{loc}</td></tr>\n",
            id = d.id,
            name = escape_html(&d.name),
            hunger = d.hunger,
            sleep = d.sleep,
            loc = escape_html(loc),
        ));
    }
    s.push_str("</table>\n");
    Response::html(200, page("Dwarves", &s))
}

pub fn entity(w: &World, id: u32) -> Response {
    let Some(d) = w.dwarf(id) else {
        return not_found();
    };
    let loc = w
        .location(d.location)
        .map(|l| l.name.as_str())
        .unwrap_or("parts unknown");

    let mut s = String::new();
    s.push_str(&format!(
        "<h1>{name}</h1>\n<img src=\"/entities/{id}/avatar.svg\" width=\"96\" height=\"96\" alt=\"{name}\">\n",
        name = escape_html(&d.name),
        id = d.id,
    ));
    s.push_str("<ul>\n");
    s.push_str(&format!("<li>Hunger: {}</li>\n", d.hunger));
    s.push_str(&format!("<li>Sleep: {}</li>\n", d.sleep));
    s.push_str(&format!(
        "<li>Whereabouts: <a href=\"/locations/{}\">{}</a></li>\n",
        d.location,
        escape_html(loc),
    ));
    s.push_str("</ul>\n");
    Response::html(200, page(&d.name, &s))
}

/// Deterministic portrait: everything derives from the dwarf's id, so the
/// same dwarf always gets the same face.
pub fn avatar(w: &World, id: u32) -> Response {
    let Some(d) = w.dwarf(id) else {
        return not_found();
    };

    let hue = (u64::from(d.id) * 47) % 360;
    let beard_hue = (u64::from(d.id) * 131 + 20) % 360;
    let mut s = String::new();
    s.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 96 96\">\n");
    s.push_str(&format!(
        "<rect width=\"96\" height=\"96\" fill=\"hsl({hue}, 30%, 85%)\"/>\n"
    ));
    s.push_str("<circle cx=\"48\" cy=\"40\" r=\"24\" fill=\"hsl(30, 45%, 70%)\"/>\n");
    s.push_str(&format!(
        "<path d=\"M 26 44 Q 48 92 70 44 Z\" fill=\"hsl({beard_hue}, 40%, 35%)\"/>\n"
    ));
    s.push_str("<circle cx=\"40\" cy=\"36\" r=\"3\" fill=\"#222\"/>\n");
    s.push_str("<circle cx=\"56\" cy=\"36\" r=\"3\" fill=\"#222\"/>\n");
    s.push_str("</svg>\n");
    Response::svg(200, s)
}

pub fn location_list(w: &World) -> Response {
    let mut s = String::new();
    s.push_str("<h1>Locations</h1>\n<ul>\n");
    for l in &w.locations {
        s.push_str(&format!(
            "<li><a href=\"/locations/{id}\">{name}</a> ({count} present)</li>\n",
            id = l.id,
            name = escape_html(&l.name),
            count = w.dwarves_at(l.id).count(),
        ));
    }
    s.push_str("</ul>\n");
    Response::html(200, page("Locations", &s))
}

pub fn location(w: &World, id: u32) -> Response {
    let Some(l) = w.location(id) else {
        return not_found();
    };

    let mut s = String::new();
    s.push_str(&format!("<h1>{}</h1>\n", escape_html(&l.name)));
    s.push_str(&format!("<p>{}</p>\n", escape_html(&l.description)));
    s.push_str("<h2>Present</h2>\n<ul>\n");
    let mut anyone = false;
    for d in w.dwarves_at(l.id) {
        anyone = true;
        s.push_str(&format!(
            "<li><a href=\"/entities/{}\">{}</a></li>\n",
            d.id,
            escape_html(&d.name),
        ));
    }
    if !anyone {
        s.push_str("<li>(nobody)</li>\n");
    }
    s.push_str("</ul>\n");
    Response::html(200, page(&l.name, &s))
}

pub fn feed(w: &World) -> Response {
    let mut s = String::new();
    s.push_str("<h1>Feed</h1>\n<ul>\n");
    for line in w.feed.newest_first() {
        s.push_str(&format!(
            "<li>[{}] {}</li>\n",
            line.at_unix,
            escape_html(&line.text),
        ));
    }
    if w.feed.is_empty() {
        s.push_str("<li>(nothing has happened yet)</li>\n");
    }
    s.push_str("</ul>\n");
    Response::html(200, page("Feed", &s))
}

/// Serialize the chart's drawing instructions into an inline SVG page.
pub fn stats_page(chart: &Chart, in_flight: u32) -> Response {
    let mut s = String::new();
    s.push_str("<h1>Stats</h1>\n");
    s.push_str(&format!("<p>Connections in flight: {in_flight}</p>\n"));
    s.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"-30 -10 {w} {h}\" width=\"{vw}\" height=\"{vh}\">\n",
        w = chart.width + 60,
        h = chart.height + 30,
        vw = chart.width,
        vh = chart.height,
    ));
    for g in &chart.gridlines {
        s.push_str(&format!(
            "<line x1=\"0\" y1=\"{y}\" x2=\"{w}\" y2=\"{y}\" stroke=\"#ccc\"/>\n",
            y = g.y,
            w = chart.width,
        ));
        s.push_str(&format!(
            "<text x=\"-6\" y=\"{y}\" text-anchor=\"end\" font-size=\"10\">{label}</text>\n",
            y = g.y + 3.0,
            label = g.label,
        ));
    }
    s.push_str("<polyline fill=\"none\" stroke=\"#336\" stroke-width=\"1.5\" points=\"");
    for (i, (x, y)) in chart.points.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        s.push_str(&format!("{x:.1},{y:.1}"));
    }
    s.push_str("\"/>\n</svg>\n");
    Response::html(200, page("Stats", &s))
}

fn page(title: &str, body: &str) -> String {
    let mut s = String::new();
    s.push_str("<html><head><title>");
    s.push_str(&escape_html(title));
    s.push_str("</title></head><body>\n");
    s.push_str(body);
    s.push_str("<hr><p><a href=\"/dwarves\">dwarves</a> | <a href=\"/locations\">locations</a> | <a href=\"/feed\">feed</a> | <a href=\"/stats\">stats</a></p>\n");
    s.push_str("</body></html>\n");
    s
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
