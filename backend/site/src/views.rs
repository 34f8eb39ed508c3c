//! Server-rendered landing page.
//!
//! The page carries a small script that binds the plan cards and buttons to
//! the JSON endpoints, collects flow answers with `prompt()`, shows the
//! current toast, and starts downloads the toast links to.

use serde_json::json;
use v_htmlescape::escape;

use crate::demo;
use crate::payment::{self, PaymentInstructions};
use crate::site::{PlansView, SAMPLE_REPORT_ROUTE};

pub fn render_landing_page(plans: &PlansView, instructions: &PaymentInstructions) -> String {
    let cards: String = plans
        .plans
        .iter()
        .map(|card| {
            let (card_class, button_class) = if card.active {
                ("freq-option active", "freq-select-btn btn-primary")
            } else {
                ("freq-option", "freq-select-btn btn-outline")
            };
            format!(
                r#"<div class="{card_class}" data-freq="{freq}" data-price="{price}">
        <h3>{label}</h3>
        <div class="price">{price} <span>USDT</span></div>
        <button type="button" class="{button_class}">Select</button>
      </div>"#,
                freq = card.control.frequency.as_str(),
                price = card.control.price,
                label = escape(card.label),
            )
        })
        .collect::<Vec<_>>()
        .join("\n      ");

    let questions = json!({
        "txHash": payment::TX_HASH_QUESTION,
        "paymentEmail": payment::EMAIL_QUESTION,
        "company": demo::COMPANY_QUESTION,
        "demoEmail": demo::EMAIL_QUESTION,
    });

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Matrix Intelligence | Market Intelligence on Your Schedule</title>
  <style>{PAGE_STYLE}</style>
</head>
<body>
  <header>
    <div class="logo">MATRIX INTELLIGENCE</div>
    <nav><a href="#pricing">Pricing</a> <a href="#payment">Payment</a></nav>
  </header>

  <section class="hero">
    <h1>Market intelligence, delivered on your schedule</h1>
    <p>Competitor moves, market sizing and strategic recommendations in one recurring report.</p>
    <button type="button" class="btn-demo btn-primary">Request a demo</button>
    <a class="btn-outline" href="{sample}" download>Download sample report</a>
  </section>

  <section id="pricing">
    <h2>Choose your frequency</h2>
    <div class="freq-grid">
      {cards}
    </div>
    <p class="summary">Selected: <strong id="selected-frequency">{selected_label}</strong>
      &middot; <strong id="selected-price">{selected_price}</strong> USDT</p>
    <button type="button" class="btn-proceed btn-primary">Proceed to payment</button>
  </section>

  <section id="payment">
    <h2>Pay with {method}</h2>
    <p>Network: {network}</p>
    <p>Address: <code id="usdt-address">{address}</code>
      <button type="button" class="btn-copy btn-outline">Copy</button></p>
    <p>{memo}. Confirmation: {confirmation}.</p>
    <button type="button" class="btn-confirm btn-primary">I have paid</button>
  </section>

  <div id="toast" class="toast" hidden></div>

  <script>const QUESTIONS = {questions};</script>
  <script>{PAGE_SCRIPT}</script>
</body>
</html>"##,
        sample = SAMPLE_REPORT_ROUTE,
        selected_label = escape(plans.selected.label),
        selected_price = plans.selected.price,
        method = escape(instructions.method),
        network = escape(instructions.network),
        address = escape(&instructions.address),
        memo = escape(instructions.memo),
        confirmation = escape(instructions.confirmation),
    )
}

const PAGE_STYLE: &str = r#"
  :root { --matrix-bg: #0f172a; --matrix-accent: #00dc82; --matrix-text: #e2e8f0; }
  body { margin: 0; font-family: 'Inter', system-ui, sans-serif; background: var(--matrix-bg); color: var(--matrix-text); }
  header { display: flex; justify-content: space-between; align-items: center; padding: 1.25rem 2rem; }
  header a { color: var(--matrix-text); margin-left: 1rem; }
  .logo { color: var(--matrix-accent); font-weight: 700; letter-spacing: 0.05em; }
  section { width: min(960px, 92vw); margin: 3rem auto; }
  .hero h1 { font-size: clamp(2rem, 4vw, 3rem); }
  .freq-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 1.25rem; }
  .freq-option { border: 1px solid rgba(148, 163, 184, 0.3); border-radius: 14px; padding: 1.5rem; cursor: pointer; }
  .freq-option.active { border-color: var(--matrix-accent); box-shadow: 0 0 0 3px rgba(0, 220, 130, 0.2); }
  .price { font-size: 1.8rem; font-weight: 700; margin: 0.75rem 0; }
  .price span { font-size: 0.9rem; opacity: 0.7; }
  button, .btn-outline, .btn-primary { border-radius: 10px; padding: 0.7rem 1.3rem; font-weight: 600; cursor: pointer; text-decoration: none; display: inline-block; }
  .btn-primary { background: var(--matrix-accent); color: var(--matrix-bg); border: none; }
  .btn-outline { background: transparent; color: var(--matrix-accent); border: 1px solid var(--matrix-accent); }
  code { background: rgba(148, 163, 184, 0.15); padding: 0.2rem 0.4rem; border-radius: 6px; }
  .toast { position: fixed; top: 20px; right: 20px; max-width: 300px; padding: 1rem 1.5rem; border-radius: 8px; z-index: 10000; font-weight: 600; box-shadow: 0 10px 25px rgba(0, 0, 0, 0.2); word-wrap: break-word; }
  .toast.success { background: var(--matrix-accent); color: var(--matrix-bg); }
  .toast.error { background: #dc2626; color: #fff; }
"#;

const PAGE_SCRIPT: &str = r#"
(function () {
  var toast = document.getElementById('toast');
  var shownId = 0;

  function startDownload(href) {
    var a = document.createElement('a');
    a.href = href;
    a.download = '';
    a.style.display = 'none';
    document.body.appendChild(a);
    a.click();
    document.body.removeChild(a);
  }

  function show(n) {
    if (!n || n.id === shownId) return;
    shownId = n.id;
    toast.textContent = n.message;
    toast.className = 'toast ' + n.severity;
    toast.hidden = false;
    if (n.link) startDownload(n.link);
  }

  function post(url, body) {
    return fetch(url, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(body || {})
    }).then(function (r) { return r.status === 204 ? null : r.json(); });
  }

  function poll() {
    fetch('/notifications/current')
      .then(function (r) { return r.json(); })
      .then(function (n) { if (n) { show(n); } else { toast.hidden = true; } })
      .catch(function () {});
  }
  setInterval(poll, 1000);

  function renderSelection(selected) {
    document.querySelectorAll('.freq-option').forEach(function (card) {
      var on = card.dataset.freq === selected.frequency;
      card.classList.toggle('active', on);
      var btn = card.querySelector('.freq-select-btn');
      if (btn) {
        btn.classList.toggle('btn-primary', on);
        btn.classList.toggle('btn-outline', !on);
      }
    });
    var freq = document.getElementById('selected-frequency');
    var price = document.getElementById('selected-price');
    if (freq && price) {
      freq.textContent = selected.label;
      price.textContent = selected.price;
    }
  }

  function scrollTo(id) {
    var el = document.getElementById(id);
    if (el) el.scrollIntoView({ behavior: 'smooth', block: 'start' });
  }

  function on(selector, handler) {
    document.querySelectorAll(selector).forEach(function (el) {
      el.addEventListener('click', function (e) { e.stopPropagation(); handler(el); });
    });
  }

  on('.freq-option', function (card) {
    post('/plans/select', { frequency: card.dataset.freq }).then(function (res) {
      if (!res) return;
      renderSelection(res);
      show(res.notification);
      scrollTo('payment');
    });
  });

  on('.btn-proceed', function () {
    post('/plans/proceed').then(show);
    scrollTo('payment');
  });

  on('.btn-confirm', function () {
    var txHash = prompt(QUESTIONS.txHash);
    var email = prompt(QUESTIONS.paymentEmail);
    post('/payment/confirm', { tx_hash: txHash, email: email }).then(function (res) {
      if (res) show(res.notification);
    });
  });

  on('.btn-demo', function () {
    var company = prompt(QUESTIONS.company);
    var email = prompt(QUESTIONS.demoEmail);
    post('/demo/request', { company: company, email: email }).then(function (res) {
      if (res) show(res.notification);
    });
  });

  on('.btn-copy', function () {
    var address = document.getElementById('usdt-address').textContent;
    function manual() {
      var area = document.createElement('textarea');
      area.value = address;
      document.body.appendChild(area);
      area.select();
      var ok = false;
      try { ok = document.execCommand('copy'); } catch (e) { ok = false; }
      document.body.removeChild(area);
      return ok ? 'manual_selection' : 'failed';
    }
    var attempt = navigator.clipboard
      ? navigator.clipboard.writeText(address).then(function () { return 'clipboard'; }, manual)
      : Promise.resolve(manual());
    attempt.then(function (outcome) {
      return post('/payment/copy-address', { outcome: outcome });
    }).then(show);
  });

  toast.addEventListener('click', function () { toast.hidden = true; });
  document.addEventListener('keydown', function (e) {
    if (e.key === 'Escape') toast.hidden = true;
  });
})();
"#;
