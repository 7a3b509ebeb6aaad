pub fn render_index() -> &'static str {
    INDEX_HTML
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>AdSense Dashboard</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef3f8;
      --bg-2: #c9dcef;
      --ink: #23272b;
      --accent: #1f7a5a;
      --accent-2: #2f4858;
      --danger: #c63b2b;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e3edf6 60%, #f4f7fa 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1040px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    .subtitle {
      margin: 6px 0 0;
      color: #5f6a73;
    }

    .filters {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: end;
    }

    .filters label {
      display: grid;
      gap: 4px;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #7a848d;
    }

    select, input {
      font: inherit;
      padding: 8px 12px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      background: white;
    }

    .tabs {
      display: flex;
      gap: 6px;
      padding: 6px;
      background: rgba(47, 72, 88, 0.08);
      border-radius: 999px;
      width: fit-content;
    }

    .tab {
      border: none;
      background: transparent;
      border-radius: 999px;
      padding: 8px 14px;
      font: inherit;
      font-weight: 600;
      color: #6b645d;
      cursor: pointer;
    }

    .tab.active {
      background: white;
      color: var(--accent-2);
      box-shadow: 0 8px 16px rgba(47, 72, 88, 0.12);
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.5rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    table {
      width: 100%;
      border-collapse: collapse;
      background: white;
      border-radius: 18px;
      overflow: hidden;
    }

    th, td {
      text-align: right;
      padding: 10px 12px;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    th:first-child, td:first-child {
      text-align: left;
    }

    .failures {
      color: var(--danger);
      margin: 0;
      padding-left: 18px;
    }

    .status {
      min-height: 1.2em;
      color: #6b645d;
    }

    .status[data-type="error"] {
      color: var(--danger);
    }

    .status[data-type="ok"] {
      color: var(--accent);
    }

    .hidden {
      display: none;
    }

    button.action {
      border: none;
      border-radius: 999px;
      padding: 6px 12px;
      margin-left: 4px;
      cursor: pointer;
      background: var(--accent-2);
      color: white;
    }

    button.action.danger {
      background: var(--danger);
    }

    @media (max-width: 600px) {
      .app {
        padding: 28px 18px;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>AdSense Dashboard</h1>
      <p class="subtitle">Earnings, clicks and impressions per account and per domain.</p>
    </header>

    <section class="filters">
      <label>Account
        <select id="account"><option value="all">All accounts</option></select>
      </label>
      <label>Period
        <select id="date-filter">
          <option value="today">Today</option>
          <option value="yesterday">Yesterday</option>
          <option value="custom">Custom date</option>
          <option value="range">Date range</option>
        </select>
      </label>
      <label id="custom-wrap" class="hidden">Date <input type="date" id="custom-date" /></label>
      <label id="start-wrap" class="hidden">From <input type="date" id="start-date" /></label>
      <label id="end-wrap" class="hidden">To <input type="date" id="end-date" /></label>
      <label id="domain-wrap" class="hidden">Domain <input type="text" id="domain" placeholder="filter" /></label>
    </section>

    <nav class="tabs" role="tablist">
      <button class="tab active" type="button" data-tab="earnings">Earnings</button>
      <button class="tab" type="button" data-tab="domains">Domains</button>
      <button class="tab" type="button" data-tab="ctr">CTR</button>
      <button class="tab" type="button" data-tab="accounts">Accounts</button>
    </nav>

    <section id="view"></section>
    <ul id="failures" class="failures"></ul>
    <div class="status" id="status"></div>
  </main>

  <script>
    const accountEl = document.getElementById('account');
    const filterEl = document.getElementById('date-filter');
    const customEl = document.getElementById('custom-date');
    const startEl = document.getElementById('start-date');
    const endEl = document.getElementById('end-date');
    const domainEl = document.getElementById('domain');
    const viewEl = document.getElementById('view');
    const failuresEl = document.getElementById('failures');
    const statusEl = document.getElementById('status');
    const tabs = Array.from(document.querySelectorAll('.tab'));

    let activeTab = 'earnings';
    let generation = 0;

    const number = new Intl.NumberFormat('id-ID');
    const currency = new Intl.NumberFormat('id-ID', { style: 'currency', currency: 'IDR', maximumFractionDigits: 0 });
    const pct = (value) => `${Number(value || 0).toFixed(2)}%`;

    function setStatus(text, type) {
      statusEl.textContent = text || '';
      statusEl.dataset.type = type || '';
    }

    function stat(label, value) {
      return `<div class="stat"><span class="label">${label}</span><span class="value">${value}</span></div>`;
    }

    function escapeHtml(text) {
      const div = document.createElement('div');
      div.textContent = text == null ? '' : String(text);
      return div.innerHTML;
    }

    function params() {
      const p = new URLSearchParams();
      p.set('account', accountEl.value);
      p.set('date_filter', filterEl.value);
      if (filterEl.value === 'custom' && customEl.value) p.set('custom_date', customEl.value);
      if (filterEl.value === 'range') {
        if (startEl.value) p.set('start_date', startEl.value);
        if (endEl.value) p.set('end_date', endEl.value);
      }
      if (activeTab === 'domains' && domainEl.value.trim()) p.set('domain', domainEl.value.trim());
      return p;
    }

    function syncInputs() {
      document.getElementById('custom-wrap').classList.toggle('hidden', filterEl.value !== 'custom');
      document.getElementById('start-wrap').classList.toggle('hidden', filterEl.value !== 'range');
      document.getElementById('end-wrap').classList.toggle('hidden', filterEl.value !== 'range');
      document.getElementById('domain-wrap').classList.toggle('hidden', activeTab !== 'domains');
    }

    function showFailures(failed) {
      failuresEl.innerHTML = (failed || [])
        .map((f) => `<li>Excluded ${escapeHtml(f.key)}: ${escapeHtml(f.reason)}</li>`)
        .join('');
    }

    function renderEarnings(data) {
      const e = data.source === 'combined'
        ? { ...data.total, date: data.date, note: data.note }
        : { ...data, earnings: data.earnings_micros / 1e6, cpm: data.cpm_idr, rpm: data.rpm_idr };
      viewEl.innerHTML = `<div class="panel">
        ${stat('Date', escapeHtml(e.date))}
        ${stat('Earnings', currency.format(e.earnings))}
        ${stat('Clicks', number.format(e.clicks))}
        ${stat('Impressions', number.format(e.impressions))}
        ${stat('Page views', number.format(e.page_views))}
        ${stat('CTR', pct(e.ctr))}
        ${stat('CPM', currency.format(e.cpm))}
        ${stat('RPM', currency.format(e.rpm))}
      </div>${e.note ? `<p class="subtitle">${escapeHtml(e.note)}</p>` : ''}`;
      showFailures(data.failed_accounts);
    }

    function renderDomains(data) {
      const rows = data.source === 'combined'
        ? data.domains.map((d) => ({ domain: d.id, earnings: d.earnings, clicks: d.clicks, impressions: d.impressions, ctr: d.ctr, rpm: d.rpm }))
        : data.domains.map((d) => ({ domain: d.domain, earnings: d.earnings_micros / 1e6, clicks: d.clicks, impressions: d.impressions, ctr: d.ctr, rpm: d.rpm_idr }));
      rows.sort((a, b) => b.earnings - a.earnings);
      viewEl.innerHTML = `<table>
        <thead><tr><th>Domain</th><th>Earnings</th><th>Clicks</th><th>Impressions</th><th>CTR</th><th>RPM</th></tr></thead>
        <tbody>${rows.map((r) => `<tr><td>${escapeHtml(r.domain)}</td><td>${currency.format(r.earnings)}</td>
          <td>${number.format(r.clicks)}</td><td>${number.format(r.impressions)}</td>
          <td>${pct(r.ctr)}</td><td>${currency.format(r.rpm)}</td></tr>`).join('')}</tbody>
      </table>`;
      showFailures(data.failed_accounts);
    }

    function renderCtr(data) {
      viewEl.innerHTML = `<div class="panel">
        ${stat('CTR', pct(data.ctr))}
        ${stat('Rating', escapeHtml(data.band.replace('_', ' ')))}
        ${stat('Clicks', number.format(data.clicks))}
        ${stat('Impressions', number.format(data.impressions))}
      </div>`;
      showFailures(data.failed_accounts);
    }

    async function renderAccounts() {
      const res = await fetch('/api/accounts');
      if (!res.ok) throw new Error('failed to load accounts');
      const accounts = await res.json();
      viewEl.innerHTML = `<table>
        <thead><tr><th>Account</th><th>Publisher</th><th>Status</th><th></th></tr></thead>
        <tbody>${accounts.map((a) => `<tr><td>${escapeHtml(a.display_name)}</td><td>${escapeHtml(a.account_id)}</td>
          <td>${escapeHtml(a.status)}</td><td>
          <button class="action" data-op="connect" data-key="${escapeHtml(a.account_key)}">Connect</button>
          <button class="action" data-op="validate" data-key="${escapeHtml(a.account_key)}">Validate</button>
          <button class="action danger" data-op="delete" data-key="${escapeHtml(a.account_key)}">Remove</button>
          </td></tr>`).join('')}</tbody>
      </table>`;
      failuresEl.innerHTML = '';
    }

    async function accountAction(op, key) {
      if (op === 'delete' && !confirm(`Remove account "${key}"? This cannot be undone.`)) return;
      const url = op === 'delete' ? `/api/accounts/${encodeURIComponent(key)}` : `/api/accounts/${encodeURIComponent(key)}/${op}`;
      const res = await fetch(url, { method: op === 'delete' ? 'DELETE' : 'POST' });
      const body = await res.json();
      if (!res.ok) return setStatus(body.error || 'Request failed', 'error');
      if (body.oauth_url) {
        window.open(body.oauth_url, '_blank');
        return setStatus(`Authorize at ${body.oauth_url}`, 'ok');
      }
      if (op === 'validate') {
        return body.valid
          ? setStatus(`Validated, publisher ${body.publisher_id || ''}`, 'ok')
          : setStatus(body.error || 'Validation failed', 'error');
      }
      setStatus(body.message || 'Done', 'ok');
      await loadAccounts();
      await refresh();
    }

    async function loadAccounts() {
      const res = await fetch('/api/accounts');
      if (!res.ok) return setStatus('Failed to load accounts', 'error');
      const accounts = await res.json();
      const selected = accountEl.value;
      accountEl.innerHTML = '<option value="all">All accounts</option>' + accounts
        .map((a) => `<option value="${escapeHtml(a.account_key)}">${escapeHtml(a.display_name)} (${escapeHtml(a.status)})</option>`)
        .join('');
      const firstActive = accounts.find((a) => a.status === 'active');
      accountEl.value = accounts.some((a) => a.account_key === selected) ? selected : (firstActive ? firstActive.account_key : 'all');
    }

    async function refresh() {
      syncInputs();
      const mine = ++generation;
      if (filterEl.value === 'range' && (!startEl.value || !endEl.value)) {
        return setStatus('Pick both a start and an end date.', 'error');
      }
      setStatus('Loading...');
      try {
        if (activeTab === 'accounts') {
          await renderAccounts();
        } else {
          const res = await fetch(`/api/${activeTab}?${params()}`);
          const data = await res.json();
          // A newer refresh has started; drop this result.
          if (mine !== generation) return;
          if (!res.ok) throw new Error(data.error || `HTTP ${res.status}`);
          if (activeTab === 'earnings') renderEarnings(data);
          if (activeTab === 'domains') renderDomains(data);
          if (activeTab === 'ctr') renderCtr(data);
        }
        if (mine === generation) setStatus('', 'ok');
      } catch (err) {
        if (mine === generation) setStatus(err.message || 'Request failed', 'error');
      }
    }

    tabs.forEach((tab) => tab.addEventListener('click', () => {
      tabs.forEach((t) => t.classList.toggle('active', t === tab));
      activeTab = tab.dataset.tab;
      refresh();
    }));

    viewEl.addEventListener('click', (event) => {
      const button = event.target.closest('button[data-op]');
      if (button) accountAction(button.dataset.op, button.dataset.key);
    });

    [accountEl, filterEl, customEl, startEl, endEl, domainEl].forEach((el) => el.addEventListener('change', refresh));

    loadAccounts().then(refresh);
  </script>
</body>
</html>
"#;
