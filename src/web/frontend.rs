//! Embedded HTML/CSS/JS frontend for the ledgerstat web dashboard.
//!
//! The entire page is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies. Charts are drawn
//! as inline SVG.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>ledgerstat Dashboard</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --purple: #bc8cff;
  --cyan: #39d2c0;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); font-weight: 700; }
header .subtitle { color: var(--text-muted); font-size: 13px; }

/* Stats grid */
.stats-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
  gap: 16px;
  margin-bottom: 24px;
}
.stat-card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  text-align: center;
}
.stat-card .value {
  font-size: 28px;
  font-weight: 700;
  font-family: var(--mono);
  color: var(--accent);
  line-height: 1.1;
}
.stat-card .value.green { color: var(--green); }
.stat-card .value.purple { color: var(--purple); }
.stat-card .value.cyan { color: var(--cyan); }
.stat-card .label {
  font-size: 12px;
  color: var(--text-muted);
  margin-top: 6px;
  text-transform: uppercase;
  letter-spacing: 0.5px;
}

/* Cards */
.grid-2 { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
@media (max-width: 900px) { .grid-2 { grid-template-columns: 1fr; } }
.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card h2 {
  font-size: 16px;
  font-weight: 600;
  margin-bottom: 16px;
  display: flex;
  align-items: center;
  justify-content: space-between;
  gap: 12px;
}

/* Forms */
form.inline, .controls { display: flex; gap: 8px; flex-wrap: wrap; margin-bottom: 16px; }
select, input[type=text] {
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 6px 10px;
  font-size: 13px;
}
.btn {
  padding: 6px 14px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--bg);
  color: var(--text);
  font-size: 13px;
  cursor: pointer;
}
.btn.primary { background: var(--accent); border-color: var(--accent); color: #fff; }
.btn:hover { opacity: 0.85; }

/* Tables */
table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 8px 12px; border-bottom: 1px solid var(--border); }
th {
  color: var(--text-muted);
  font-weight: 500;
  font-size: 12px;
  text-transform: uppercase;
  letter-spacing: 0.5px;
}
td.num { text-align: right; font-family: var(--mono); }
th.num { text-align: right; }
td.muted { color: var(--text-muted); }
tr:hover { background: rgba(255,255,255,0.02); }
.scroll { max-height: 420px; overflow-y: auto; }

/* Charts */
.chart-row { display: flex; align-items: center; gap: 24px; flex-wrap: wrap; }
.legend { font-size: 12px; color: var(--text-muted); }
.legend div { display: flex; align-items: center; gap: 6px; margin-bottom: 4px; }
.legend .swatch { width: 10px; height: 10px; border-radius: 3px; display: inline-block; }
svg text { fill: var(--text-muted); font-size: 10px; font-family: var(--mono); }

.summary-stats {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(110px, 1fr));
  gap: 8px;
  margin-bottom: 16px;
}
.summary-stats div { background: var(--bg); border-radius: 6px; padding: 8px; text-align: center; }
.summary-stats b { display: block; font-family: var(--mono); font-size: 16px; color: var(--accent); }
.summary-stats span { font-size: 11px; color: var(--text-muted); text-transform: uppercase; }

.empty-state { text-align: center; padding: 24px; color: var(--text-muted); }

/* Toast */
.toast {
  position: fixed;
  bottom: 24px;
  right: 24px;
  background: var(--surface);
  border: 1px solid var(--green);
  color: var(--green);
  padding: 10px 16px;
  border-radius: var(--radius);
  opacity: 0;
  transition: opacity 0.2s;
  pointer-events: none;
}
.toast.show { opacity: 1; }
.toast.error { border-color: var(--red); color: var(--red); }
</style>
</head>
<body>
<div class="app">

  <header>
    <div>
      <h1><span class="logo">ledgerstat</span> Dashboard</h1>
      <div class="subtitle">Descriptive statistics over your purchases</div>
    </div>
  </header>

  <div class="stats-grid">
    <div class="stat-card"><div class="value" id="stat-count">-</div><div class="label">Purchases</div></div>
    <div class="stat-card"><div class="value green" id="stat-total">-</div><div class="label">Total sales</div></div>
    <div class="stat-card"><div class="value purple" id="stat-stores">-</div><div class="label">Stores</div></div>
    <div class="stat-card"><div class="value cyan" id="stat-categories">-</div><div class="label">Categories</div></div>
  </div>

  <!-- Statistical summary form -->
  <div class="card">
    <h2>Statistical summary</h2>
    <form class="inline" id="summary-form">
      <select id="summary-dimension">
        <option value="store">Store</option>
        <option value="category">Category</option>
        <option value="payment">Payment method</option>
      </select>
      <select id="summary-value"></select>
      <button class="btn primary" type="submit">Show</button>
    </form>
    <div id="summary-result" class="empty-state">Pick a store, category or payment method.</div>
  </div>

  <div class="grid-2">
    <!-- Totals -->
    <div class="card">
      <h2>Sum of sales
        <select id="totals-dimension">
          <option value="store">by store</option>
          <option value="category">by category</option>
          <option value="payment">by payment</option>
        </select>
      </h2>
      <div class="scroll">
        <table>
          <thead><tr><th id="totals-label">Store</th><th class="num">Count</th><th class="num">Sum</th><th class="num">Std dev</th><th class="num">Share</th></tr></thead>
          <tbody id="totals-tbody"></tbody>
        </table>
      </div>
    </div>

    <!-- Pie chart -->
    <div class="card">
      <h2>Purchases
        <select id="pie-dimension">
          <option value="category">by category</option>
          <option value="payment">by payment</option>
          <option value="store">by store</option>
        </select>
      </h2>
      <div class="chart-row">
        <svg id="pie-chart" width="220" height="220" viewBox="-110 -110 220 220"></svg>
        <div class="legend" id="pie-legend"></div>
      </div>
    </div>
  </div>

  <!-- Trend line chart -->
  <div class="card">
    <h2>Sales over time
      <select id="trend-by">
        <option value="day">per day</option>
        <option value="month" selected>per month</option>
        <option value="year">per year</option>
      </select>
    </h2>
    <svg id="trend-chart" width="100%" height="220" viewBox="0 0 1000 220" preserveAspectRatio="none"></svg>
  </div>

  <!-- Ledger -->
  <div class="card">
    <h2>Ledger
      <span class="controls" style="margin:0">
        <button class="btn" data-sort="date" data-order="asc">Date ↑</button>
        <button class="btn" data-sort="date" data-order="desc">Date ↓</button>
        <button class="btn" data-sort="price" data-order="asc">Price ↑</button>
        <button class="btn" data-sort="price" data-order="desc">Price ↓</button>
      </span>
    </h2>
    <form class="inline" id="filter-form">
      <input type="text" id="filter-pattern" placeholder="Store pattern (regex, case-insensitive)">
      <button class="btn primary" type="submit">Filter</button>
      <button class="btn" type="button" id="filter-clear">Clear</button>
    </form>
    <div class="scroll">
      <table>
        <thead><tr><th>Date</th><th>Time</th><th>Store</th><th>Category</th><th class="num">Price</th><th>Payment</th></tr></thead>
        <tbody id="records-tbody"></tbody>
      </table>
    </div>
    <div class="legend" id="records-note"></div>
  </div>

</div>

<div class="toast" id="toast"></div>

<script>
// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------
let overview = null;
const COLORS = ['#58a6ff', '#3fb950', '#bc8cff', '#d29922', '#39d2c0', '#f85149',
                '#ff7b72', '#79c0ff', '#56d364', '#e3b341', '#d2a8ff', '#8b949e'];

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path) {
  const res = await fetch(path, { method });
  const body = await res.json();
  if (!res.ok) throw new Error(body.error || res.statusText);
  return body;
}

function toast(msg, isError) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = 'toast show' + (isError ? ' error' : '');
  setTimeout(() => el.className = 'toast', 3000);
}

function money(n) {
  if (n === undefined || n === null) return 'n/a';
  return n.toLocaleString(undefined, { minimumFractionDigits: 2, maximumFractionDigits: 2 });
}

function pct(n) {
  if (n === undefined || n === null) return 'undefined';
  return n.toFixed(2) + '%';
}

function qs(params) {
  return new URLSearchParams(params).toString();
}

// ---------------------------------------------------------------------------
// Overview + form options
// ---------------------------------------------------------------------------
async function loadOverview() {
  try {
    overview = await api('GET', '/api/overview');
    document.getElementById('stat-count').textContent = overview.count.toLocaleString();
    document.getElementById('stat-total').textContent = money(overview.total);
    document.getElementById('stat-stores').textContent = overview.stores.length;
    document.getElementById('stat-categories').textContent = overview.categories.length;
    fillSummaryValues();
  } catch (e) {
    toast('Failed to load overview: ' + e.message, true);
  }
}

function labelsFor(dimension) {
  if (!overview) return [];
  return { store: overview.stores, category: overview.categories, payment: overview.payments }[dimension];
}

function fillSummaryValues() {
  const dimension = document.getElementById('summary-dimension').value;
  document.getElementById('summary-value').innerHTML =
    labelsFor(dimension).map(l => `<option value="${esc(l)}">${esc(l)}</option>`).join('');
}

// ---------------------------------------------------------------------------
// Summary form
// ---------------------------------------------------------------------------
async function submitSummary(e) {
  e.preventDefault();
  const dimension = document.getElementById('summary-dimension').value;
  const value = document.getElementById('summary-value').value;
  const out = document.getElementById('summary-result');
  try {
    const r = await api('GET', '/api/summary?' + qs({ dimension, value }));
    const s = r.summary;
    out.className = '';
    out.innerHTML = `
      <div class="summary-stats">
        <div><b>${s.count}</b><span>Purchases</span></div>
        <div><b>${money(s.sum)}</b><span>Sum</span></div>
        <div><b>${money(s.mean)}</b><span>Mean</span></div>
        <div><b>${money(s.std_dev)}</b><span>Std dev</span></div>
        <div><b>${money(s.min)}</b><span>Min</span></div>
        <div><b>${money(s.max)}</b><span>Max</span></div>
      </div>
      <table>
        <thead><tr><th>${esc(r.breakdown_dimension)}</th><th class="num">Count</th><th class="num">Sum</th><th class="num">Mean</th><th class="num">Share of ${esc(r.value)}</th></tr></thead>
        <tbody>${r.breakdown.map(g => `
          <tr><td>${esc(g.label)}</td><td class="num">${g.count}</td><td class="num">${money(g.sum)}</td>
          <td class="num">${money(g.mean)}</td><td class="num">${pct(g.percentage)}</td></tr>`).join('')}
        </tbody>
      </table>`;
  } catch (err) {
    out.className = 'empty-state';
    out.textContent = err.message;
  }
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------
async function loadTotals() {
  const dimension = document.getElementById('totals-dimension').value;
  try {
    const r = await api('GET', '/api/totals?' + qs({ dimension }));
    document.getElementById('totals-label').textContent = dimension;
    document.getElementById('totals-tbody').innerHTML = r.rows.map(g => `
      <tr><td>${esc(g.label)}</td><td class="num">${g.count}</td><td class="num">${money(g.sum)}</td>
      <td class="num">${money(g.std_dev)}</td><td class="num">${pct(g.percentage)}</td></tr>`).join('');
  } catch (e) {
    toast('Failed to load totals: ' + e.message, true);
  }
}

// ---------------------------------------------------------------------------
// Pie chart
// ---------------------------------------------------------------------------
async function loadPie() {
  const dimension = document.getElementById('pie-dimension').value;
  try {
    const r = await api('GET', '/api/distribution?' + qs({ dimension }));
    renderPie(r.slices);
  } catch (e) {
    toast('Failed to load distribution: ' + e.message, true);
  }
}

function renderPie(slices) {
  const svg = document.getElementById('pie-chart');
  const legend = document.getElementById('pie-legend');
  if (slices.length === 0) {
    svg.innerHTML = '';
    legend.innerHTML = '<div>No purchases</div>';
    return;
  }

  const radius = 100;
  let angle = -Math.PI / 2;
  let paths = '';
  slices.forEach((s, i) => {
    const color = COLORS[i % COLORS.length];
    const share = (s.share || 0) / 100;
    if (share >= 0.9999) {
      paths += `<circle r="${radius}" fill="${color}"></circle>`;
      return;
    }
    const end = angle + share * 2 * Math.PI;
    const large = share > 0.5 ? 1 : 0;
    const x1 = radius * Math.cos(angle), y1 = radius * Math.sin(angle);
    const x2 = radius * Math.cos(end), y2 = radius * Math.sin(end);
    paths += `<path d="M0,0 L${x1},${y1} A${radius},${radius} 0 ${large} 1 ${x2},${y2} Z" fill="${color}"><title>${esc(s.label)}: ${pct(s.share)}</title></path>`;
    angle = end;
  });
  svg.innerHTML = paths;
  legend.innerHTML = slices.map((s, i) =>
    `<div><span class="swatch" style="background:${COLORS[i % COLORS.length]}"></span>${esc(s.label)} ${pct(s.share)} (${s.count})</div>`
  ).join('');
}

// ---------------------------------------------------------------------------
// Trend line chart
// ---------------------------------------------------------------------------
async function loadTrend() {
  const by = document.getElementById('trend-by').value;
  try {
    const r = await api('GET', '/api/trend?' + qs({ by }));
    renderTrend(r.points);
  } catch (e) {
    toast('Failed to load trend: ' + e.message, true);
  }
}

function renderTrend(points) {
  const svg = document.getElementById('trend-chart');
  if (points.length === 0) {
    svg.innerHTML = '<text x="500" y="110" text-anchor="middle">No purchases</text>';
    return;
  }

  const width = 1000, height = 220, pad = 30;
  const max = Math.max(...points.map(p => p.sum));
  const min = Math.min(...points.map(p => p.sum), 0);
  const span = max - min || 1;
  const step = points.length > 1 ? (width - 2 * pad) / (points.length - 1) : 0;
  const xy = points.map((p, i) => [
    pad + i * step,
    height - pad - ((p.sum - min) / span) * (height - 2 * pad),
  ]);

  const line = xy.map(([x, y]) => `${x.toFixed(1)},${y.toFixed(1)}`).join(' ');
  const dots = xy.map(([x, y], i) =>
    `<circle cx="${x}" cy="${y}" r="3" fill="#58a6ff"><title>${esc(points[i].period)}: ${money(points[i].sum)}</title></circle>`
  ).join('');
  const first = points[0].period, last = points[points.length - 1].period;

  svg.innerHTML = `
    <line x1="${pad}" y1="${height - pad}" x2="${width - pad}" y2="${height - pad}" stroke="#30363d"></line>
    <polyline points="${line}" fill="none" stroke="#58a6ff" stroke-width="2"></polyline>
    ${dots}
    <text x="${pad}" y="${height - 8}">${esc(first)}</text>
    <text x="${width - pad}" y="${height - 8}" text-anchor="end">${esc(last)}</text>
    <text x="${pad}" y="${pad - 8}">${money(max)}</text>`;
}

// ---------------------------------------------------------------------------
// Ledger, sorting and filtering
// ---------------------------------------------------------------------------
function renderRecords(records, note) {
  document.getElementById('records-tbody').innerHTML = records.map(r => `
    <tr><td>${r.date}</td><td class="muted">${r.time}</td><td>${esc(r.store)}</td>
    <td>${esc(r.category)}</td><td class="num">${money(r.price)}</td><td>${esc(r.payment)}</td></tr>`).join('');
  document.getElementById('records-note').textContent = note;
}

async function loadRecords() {
  try {
    const r = await api('GET', '/api/records?limit=200');
    renderRecords(r.records, `Showing ${r.records.length} of ${r.total} purchases`);
  } catch (e) {
    toast('Failed to load ledger: ' + e.message, true);
  }
}

async function sortLedger(by, order) {
  try {
    await api('POST', '/api/sort?' + qs({ by, order }));
    toast(`Ledger sorted by ${by} (${order})`);
    loadRecords();
  } catch (e) {
    toast('Sort failed: ' + e.message, true);
  }
}

async function submitFilter(e) {
  e.preventDefault();
  const pattern = document.getElementById('filter-pattern').value;
  try {
    const r = await api('GET', '/api/filter?' + qs({ pattern }));
    renderRecords(r.records, `${r.records.length} purchases at stores matching "${pattern}"`);
  } catch (err) {
    toast(err.message, true);
  }
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------
function esc(s) {
  if (!s) return '';
  return String(s).replace(/&/g,'&amp;').replace(/</g,'&lt;').replace(/>/g,'&gt;').replace(/"/g,'&quot;');
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------
document.getElementById('summary-dimension').addEventListener('change', fillSummaryValues);
document.getElementById('summary-form').addEventListener('submit', submitSummary);
document.getElementById('totals-dimension').addEventListener('change', loadTotals);
document.getElementById('pie-dimension').addEventListener('change', loadPie);
document.getElementById('trend-by').addEventListener('change', loadTrend);
document.getElementById('filter-form').addEventListener('submit', submitFilter);
document.getElementById('filter-clear').addEventListener('click', () => {
  document.getElementById('filter-pattern').value = '';
  loadRecords();
});
document.querySelectorAll('[data-sort]').forEach(b =>
  b.addEventListener('click', () => sortLedger(b.dataset.sort, b.dataset.order)));

loadOverview();
loadTotals();
loadPie();
loadTrend();
loadRecords();
</script>
</body>
</html>"##;
