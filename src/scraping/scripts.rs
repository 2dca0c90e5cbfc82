//! JavaScript evaluated in the playlist page.
//!
//! Every script returns a non-null value (or nothing at all) so results can be
//! read back with `into_value` without tripping over CDP's null handling.
//! Selector strings are embedded through `serde_json` so quoting is always valid.

use super::selectors;
use crate::core::types::ItemHandle;

fn js(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn item_query(handle: ItemHandle) -> String {
    js(&format!("[{}=\"{}\"]", selectors::HANDLE_ATTR, handle.0))
}

pub fn item_count() -> String {
    format!(
        "document.querySelectorAll({}).length",
        js(selectors::ITEM)
    )
}

pub const CONTENT_EXTENT: &str = "Math.max(document.body ? document.body.scrollHeight : 0, document.documentElement.scrollHeight)";

pub const SCROLL_OFFSET: &str = "window.scrollY || document.documentElement.scrollTop || 0";

pub const SCROLL_TO_END: &str = "window.scrollTo(0, Math.max(document.body ? document.body.scrollHeight : 0, document.documentElement.scrollHeight)); true";

pub fn scroll_to(offset: f64) -> String {
    let y = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
    format!("window.scrollTo(0, {}); true", y)
}

pub fn container_present() -> String {
    format!("!!document.querySelector({})", js(selectors::LIST_CONTAINER))
}

pub fn loading_indicator_present() -> String {
    format!(
        "!!document.querySelector({})",
        js(selectors::LOADING_PLACEHOLDER)
    )
}

/// Installs the mutation and intersection watchers on `window.__playlistSweep`.
/// Returns `false` when the list container is missing.
pub fn install_observers() -> String {
    format!(
        r#"(() => {{
    const prev = window.__playlistSweep;
    if (prev && prev.disconnect) prev.disconnect();
    const container = document.querySelector({list});
    if (!container) return false;
    const state = {{ changed: false, lastVisible: false, target: null }};
    state.io = new IntersectionObserver((entries) => {{
        for (const e of entries) {{
            if (e.target === state.target) state.lastVisible = e.isIntersecting;
        }}
    }});
    const track = () => {{
        const items = container.querySelectorAll({item});
        const last = items.length ? items[items.length - 1] : null;
        if (last === state.target) return;
        if (state.target) state.io.unobserve(state.target);
        state.target = last;
        state.lastVisible = false;
        if (last) state.io.observe(last);
    }};
    state.mo = new MutationObserver(() => {{ state.changed = true; track(); }});
    state.mo.observe(container, {{ childList: true, subtree: true }});
    track();
    state.disconnect = () => {{ state.mo.disconnect(); state.io.disconnect(); }};
    window.__playlistSweep = state;
    return true;
}})()"#,
        list = js(selectors::LIST_CONTAINER),
        item = js(selectors::ITEM),
    )
}

pub const TAKE_STRUCTURE_CHANGED: &str = r#"(() => {
    const s = window.__playlistSweep;
    if (!s) return false;
    const changed = s.changed;
    s.changed = false;
    return changed;
})()"#;

pub const LAST_ITEM_VISIBLE: &str =
    "!!(window.__playlistSweep && window.__playlistSweep.lastVisible)";

pub const DISCONNECT_OBSERVERS: &str = r#"(() => {
    const s = window.__playlistSweep;
    if (s && s.disconnect) s.disconnect();
    delete window.__playlistSweep;
    return true;
})()"#;

/// Stamps the handle attribute on every rendered item and returns the raw
/// fields as an array shaped like `RawItem`.
pub fn snapshot_items() -> String {
    format!(
        r#"(() => {{
    const text = (el) => el ? (el.textContent || '').replace(/\s+/g, ' ').trim() : '';
    return Array.from(document.querySelectorAll({item})).map((node, i) => {{
        node.setAttribute({handle_attr}, String(i));
        const t = node.querySelector({title});
        const titleAttr = t ? (t.getAttribute('title') || '').trim() : '';
        const title = t ? (titleAttr || text(t)) : '';
        const ch = node.querySelector({channel});
        const bar = node.querySelector({resume});
        const out = {{
            handle: i,
            watched_marker: !!node.querySelector({watched}),
            metadata: Array.from(node.querySelectorAll({metadata})).map(text).filter(Boolean),
        }};
        if (title) out.title = title;
        if (t && t.getAttribute('href')) out.title_href = t.getAttribute('href');
        if (ch && text(ch)) out.channel = text(ch);
        if (bar) out.resume_width = bar.style.width || bar.getAttribute('style') || '';
        return out;
    }});
}})()"#,
        item = js(selectors::ITEM),
        handle_attr = js(selectors::HANDLE_ATTR),
        title = js(selectors::TITLE),
        channel = js(selectors::CHANNEL),
        resume = js(selectors::RESUME_BAR),
        watched = js(selectors::WATCHED_MARKER),
        metadata = js(selectors::METADATA_TEXT),
    )
}

pub fn scroll_into_view(handle: ItemHandle) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({q});
    if (!el) return false;
    el.scrollIntoView({{ block: 'center' }});
    return true;
}})()"#,
        q = item_query(handle)
    )
}

/// Returns `"ok"`, `"no-item"` or `"no-button"`.
pub fn open_menu(handle: ItemHandle) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({q});
    if (!el) return 'no-item';
    const btn = el.querySelector({button});
    if (!btn) return 'no-button';
    btn.click();
    return 'ok';
}})()"#,
        q = item_query(handle),
        button = js(selectors::MENU_BUTTON),
    )
}

/// Marks the first visible menu entry whose text contains one of `labels`
/// and returns its text, or `""` when none matches yet.
pub fn locate_control(labels: &[String]) -> String {
    let labels = serde_json::to_string(labels).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
    const labels = {labels};
    for (const old of document.querySelectorAll('[' + {attr} + ']')) old.removeAttribute({attr});
    for (const e of document.querySelectorAll({entry})) {{
        if (e.offsetParent === null) continue;
        const label = (e.textContent || '').replace(/\s+/g, ' ').trim();
        const lower = label.toLowerCase();
        if (labels.some((l) => lower.includes(l))) {{
            e.setAttribute({attr}, '1');
            return label;
        }}
    }}
    return '';
}})()"#,
        labels = labels,
        attr = js(selectors::CONTROL_ATTR),
        entry = js(selectors::MENU_ENTRY),
    )
}

pub fn activate_control() -> String {
    format!(
        r#"(() => {{
    const e = document.querySelector('[' + {attr} + ']');
    if (!e) return false;
    e.removeAttribute({attr});
    e.click();
    return true;
}})()"#,
        attr = js(selectors::CONTROL_ATTR),
    )
}

pub const DISMISS_MENU: &str = r#"(() => {
    const target = document.activeElement || document.body;
    for (const type of ['keydown', 'keyup']) {
        target.dispatchEvent(new KeyboardEvent(type, { key: 'Escape', code: 'Escape', keyCode: 27, bubbles: true }));
    }
    return true;
})()"#;

/// Creates the status overlay (with its Stop button) if needed and sets its text.
pub fn show_status(text: &str) -> String {
    format!(
        r#"(() => {{
    const id = {id};
    let box = document.getElementById(id);
    if (!box) {{
        box = document.createElement('div');
        box.id = id;
        box.style.position = 'fixed';
        box.style.right = '16px';
        box.style.bottom = '16px';
        box.style.zIndex = '2147483647';
        box.style.padding = '12px 16px';
        box.style.borderRadius = '8px';
        box.style.background = 'rgba(0,0,0,0.85)';
        box.style.color = 'white';
        box.style.font = '14px sans-serif';
        box.style.display = 'flex';
        box.style.gap = '12px';
        box.style.alignItems = 'center';
        const label = document.createElement('span');
        label.className = 'status';
        const btn = document.createElement('button');
        btn.textContent = 'Stop';
        btn.style.cursor = 'pointer';
        btn.onclick = () => {{
            window.__playlistSweepCancel = true;
            btn.disabled = true;
            btn.textContent = 'Stopping…';
        }};
        box.appendChild(label);
        box.appendChild(btn);
        document.documentElement.appendChild(box);
    }}
    box.querySelector('.status').textContent = {text};
    return true;
}})()"#,
        id = js(selectors::OVERLAY_ID),
        text = js(text),
    )
}

pub const CANCEL_REQUESTED: &str = "window.__playlistSweepCancel === true";

/// Removes the overlay and every attribute stamped during the run.
pub fn remove_controls() -> String {
    format!(
        r#"(() => {{
    const box = document.getElementById({id});
    if (box) box.remove();
    delete window.__playlistSweepCancel;
    for (const attr of [{handle_attr}, {control_attr}]) {{
        for (const el of document.querySelectorAll('[' + attr + ']')) el.removeAttribute(attr);
    }}
    return true;
}})()"#,
        id = js(selectors::OVERLAY_ID),
        handle_attr = js(selectors::HANDLE_ATTR),
        control_attr = js(selectors::CONTROL_ATTR),
    )
}
