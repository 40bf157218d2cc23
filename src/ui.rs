use crate::balance::bowler_balance;
use crate::grid::{balance_view, cell_view, BalanceTone, CellIcon, CellView};
use crate::models::{CellKey, League, LeagueBook};
use chrono::Duration;
use std::fmt::Write as _;

pub fn render_home(book: &LeagueBook) -> String {
    let mut cards = String::new();
    for (id, league) in &book.leagues {
        let fines = if league.has_fines {
            format!("${:.2} fine", league.fine_amount)
        } else {
            "no fines".to_string()
        };
        let _ = write!(
            cards,
            r#"<a class="league-card" href="/attendance/{id}">
  <span class="league-name">{name}</span>
  <span class="league-meta">{weeks} weeks from {start} &middot; ${fee:.2}/week &middot; {fines}</span>
</a>
"#,
            id = id,
            name = escape(&league.name),
            weeks = league.weeks,
            start = league.start_date,
            fee = league.social_fee,
            fines = fines,
        );
    }
    if cards.is_empty() {
        cards.push_str(r#"<p class="empty">No leagues yet. Seed the data file to get started.</p>"#);
    }

    HOME_HTML.replace("{{LEAGUES}}", &cards)
}

pub fn render_grid(league_id: u64, league: &League, book: &LeagueBook) -> String {
    let mut headers = String::new();
    for week in 1..=league.weeks {
        let date = league.start_date + Duration::weeks(i64::from(week) - 1);
        let _ = write!(
            headers,
            r#"<th class="week"><span>W{week}</span><span class="week-date">{}</span></th>"#,
            date.format("%d %b"),
        );
    }

    let mut rows = String::new();
    for &bowler_id in &league.roster {
        let name = book
            .bowlers
            .get(&bowler_id)
            .map(|bowler| escape(&bowler.name))
            .unwrap_or_else(|| format!("Bowler {bowler_id}"));
        let _ = write!(rows, r#"<tr><td class="bowler">{name}</td>"#);

        for week in 1..=league.weeks {
            let key = CellKey::new(bowler_id, league_id, week);
            let (status, amount) = match book.record(key) {
                Some(record) => (record.status, record.amount_paid),
                None => Default::default(),
            };
            let _ = write!(
                rows,
                r#"<td class="attendance-cell{class}" data-bowler="{bowler_id}" data-league="{league_id}" data-week="{week}" data-status="{status}" data-amount="{amount}">{inner}</td>"#,
                class = css_class_suffix(cell_view(status)),
                status = status,
                amount = amount,
                inner = cell_markup(cell_view(status)),
            );
        }

        let _ = write!(
            rows,
            r#"<td class="balance" id="balance-{bowler_id}">{}</td></tr>"#,
            balance_markup(bowler_balance(book, bowler_id, league_id)),
        );
        rows.push('\n');
    }

    GRID_HTML
        .replace("{{LEAGUE_NAME}}", &escape(&league.name))
        .replace("{{WEEK_HEADERS}}", &headers)
        .replace("{{ROWS}}", &rows)
}

fn css_class_suffix(view: CellView) -> String {
    match view.css_class {
        Some(class) => format!(" {class}"),
        None => String::new(),
    }
}

/// Inner markup for a cell, per the rendering contract: one icon per status,
/// a bare `-` for `none`.
fn cell_markup(view: CellView) -> &'static str {
    match view.icon {
        Some(CellIcon::Check) => r#"<span class="attendance-icon">&#10003;</span>"#,
        Some(CellIcon::Cross) => r#"<span class="attendance-icon">&#10007;</span>"#,
        Some(CellIcon::Wrench) => r#"<span class="attendance-icon">&#128295;</span>"#,
        None => "-",
    }
}

fn balance_markup(balance: f64) -> String {
    let view = balance_view(balance);
    let tone = match view.tone {
        BalanceTone::Owing => "text-danger",
        BalanceTone::Clear => "text-success",
    };
    format!(r#"<span class="{tone}">{}</span>"#, view.text)
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const HOME_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Tenpin League</title>
  <style>
    :root {
      --bg: #f6f2ea;
      --ink: #28302e;
      --accent: #1f6f54;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(31, 111, 84, 0.14);
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", "Segoe UI", sans-serif;
      display: grid;
      place-items: start center;
      padding: 48px 18px;
    }

    main {
      width: min(680px, 100%);
      display: grid;
      gap: 18px;
    }

    h1 {
      margin: 0 0 6px;
      font-size: 2.2rem;
    }

    .subtitle {
      margin: 0;
      color: #6b6f6c;
    }

    .league-card {
      display: grid;
      gap: 4px;
      background: var(--card);
      border-radius: 14px;
      padding: 18px 22px;
      box-shadow: var(--shadow);
      text-decoration: none;
      color: inherit;
    }

    .league-card:hover .league-name {
      color: var(--accent);
    }

    .league-name {
      font-size: 1.2rem;
      font-weight: 600;
    }

    .league-meta {
      color: #6b6f6c;
      font-size: 0.9rem;
    }

    .empty {
      color: #6b6f6c;
    }
  </style>
</head>
<body>
  <main>
    <header>
      <h1>Tenpin League</h1>
      <p class="subtitle">Pick a league to open its attendance and fee grid.</p>
    </header>
    {{LEAGUES}}
  </main>
</body>
</html>
"#;

const GRID_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{LEAGUE_NAME}} - Attendance</title>
  <style>
    :root {
      --bg: #f6f2ea;
      --ink: #28302e;
      --accent: #1f6f54;
      --paid: #d8f0e1;
      --missed: #f6d8d4;
      --fixed: #f7ecc9;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(31, 111, 84, 0.14);
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", "Segoe UI", sans-serif;
      padding: 36px 18px;
      display: grid;
      place-items: start center;
    }

    main {
      width: min(1100px, 100%);
      background: var(--card);
      border-radius: 16px;
      box-shadow: var(--shadow);
      padding: 26px 30px 34px;
      display: grid;
      gap: 18px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    h1 {
      margin: 0;
      font-size: 1.7rem;
    }

    .hint {
      margin: 0;
      color: #6b6f6c;
      font-size: 0.88rem;
    }

    a.back {
      color: var(--accent);
      text-decoration: none;
      font-size: 0.9rem;
    }

    #verify-tba-btn {
      border: none;
      border-radius: 999px;
      background: var(--accent);
      color: white;
      font-weight: 600;
      padding: 10px 18px;
      cursor: pointer;
    }

    #verify-tba-btn:disabled {
      opacity: 0.6;
      cursor: wait;
    }

    .grid-scroll {
      overflow-x: auto;
    }

    table {
      border-collapse: collapse;
      width: 100%;
    }

    th, td {
      border: 1px solid #e4e0d6;
      padding: 8px 10px;
      text-align: center;
      font-size: 0.92rem;
    }

    th.week span {
      display: block;
    }

    .week-date {
      font-weight: 400;
      color: #6b6f6c;
      font-size: 0.78rem;
    }

    td.bowler {
      text-align: left;
      font-weight: 600;
      white-space: nowrap;
    }

    td.attendance-cell {
      cursor: pointer;
      min-width: 54px;
      user-select: none;
    }

    td.attendance-cell.paid { background: var(--paid); }
    td.attendance-cell.missed { background: var(--missed); }
    td.attendance-cell.fixed { background: var(--fixed); }

    .attendance-icon {
      font-size: 1rem;
    }

    .fix-btn {
      display: block;
      margin: 4px auto 0;
      border: none;
      border-radius: 6px;
      background: #c98a1b;
      color: white;
      font-size: 0.7rem;
      font-weight: 700;
      padding: 2px 8px;
      cursor: pointer;
    }

    td.attendance-cell input {
      width: 64px;
      font-size: 0.88rem;
      padding: 2px 4px;
    }

    td.balance {
      font-weight: 600;
      white-space: nowrap;
    }

    .text-danger { color: #b3362a; }
    .text-success { color: #1f6f54; }
  </style>
</head>
<body>
  <main>
    <header>
      <div>
        <h1>{{LEAGUE_NAME}}</h1>
        <p class="hint">Click: paid &middot; right-click: missed &middot; double-click: enter amount</p>
      </div>
      <div>
        <a class="back" href="/">&larr; leagues</a>
        <button id="verify-tba-btn" type="button">Verify TBA</button>
      </div>
    </header>

    <div class="grid-scroll">
      <table id="attendance-grid">
        <thead>
          <tr><th>Bowler</th>{{WEEK_HEADERS}}<th>Balance</th></tr>
        </thead>
        <tbody>
          {{ROWS}}
        </tbody>
      </table>
    </div>
  </main>

  <script>
    const ICONS = { paid: '✓', missed: '✗', fixed: '\u{1F527}' };

    const nextStatus = (current) => {
      switch (current) {
        case 'paid': return 'none';
        case 'none':
        case 'missed':
        default: return 'paid';
      }
    };

    const renderCell = (cell, status) => {
      cell.classList.remove('paid', 'missed', 'fixed');
      if (ICONS[status]) {
        cell.classList.add(status);
        cell.innerHTML = '<span class="attendance-icon">' + ICONS[status] + '</span>';
      } else {
        cell.innerHTML = '-';
      }
      cell.dataset.status = status;
    };

    const updateBalance = (bowlerId, balance) => {
      const node = document.getElementById('balance-' + bowlerId);
      if (!node) return;
      if (balance > 0) {
        node.innerHTML = '<span class="text-danger">$' + balance.toFixed(2) + '</span>';
      } else {
        node.innerHTML = '<span class="text-success">$0.00</span>';
      }
    };

    const sendUpdate = async (cell, status, amount) => {
      const payload = {
        bowler_id: Number(cell.dataset.bowler),
        league_id: Number(cell.dataset.league),
        week_number: Number(cell.dataset.week),
        status: status
      };
      if (amount !== null) payload.amount = amount;
      try {
        const res = await fetch('/attendance/update', {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify(payload)
        });
        if (!res.ok) throw new Error('rejected');
        const data = await res.json();
        if (typeof data.balance === 'number') updateBalance(payload.bowler_id, data.balance);
      } catch (err) {
        alert('Failed to update attendance. Please try again.');
      }
    };

    const apply = (cell, status, amount) => {
      renderCell(cell, status);
      sendUpdate(cell, status, amount);
    };

    const showFixButton = (cell) => {
      if (cell.querySelector('.fix-btn')) return;
      const btn = document.createElement('button');
      btn.type = 'button';
      btn.className = 'fix-btn';
      btn.textContent = 'FIX';
      btn.addEventListener('click', (event) => {
        event.stopPropagation();
        apply(cell, 'fixed', null);
      });
      cell.appendChild(btn);
    };

    const enterEdit = (cell) => {
      if (cell.querySelector('input')) return;
      const input = document.createElement('input');
      input.type = 'number';
      input.step = '0.01';
      input.value = (parseFloat(cell.dataset.amount) || 0).toFixed(2);
      cell.innerHTML = '';
      cell.appendChild(input);
      input.focus();
      input.select();
      input.addEventListener('blur', () => {
        const parsed = parseFloat(input.value);
        const amount = parsed > 0 ? parsed : 0;
        cell.dataset.amount = amount;
        apply(cell, amount > 0 ? 'paid' : 'none', amount);
      });
      input.addEventListener('keypress', (event) => {
        if (event.key === 'Enter') input.blur();
      });
    };

    document.querySelectorAll('.attendance-cell').forEach((cell) => {
      cell.addEventListener('click', () => {
        if (cell.querySelector('input')) return;
        apply(cell, nextStatus(cell.dataset.status || 'none'), null);
      });
      cell.addEventListener('contextmenu', (event) => {
        event.preventDefault();
        apply(cell, 'missed', null);
        showFixButton(cell);
      });
      cell.addEventListener('dblclick', (event) => {
        event.preventDefault();
        enterEdit(cell);
      });
    });

    const verifyBtn = document.getElementById('verify-tba-btn');
    verifyBtn.addEventListener('click', async () => {
      verifyBtn.disabled = true;
      try {
        const res = await fetch('/bowlers/verify-tba', { method: 'POST' });
        if (!res.ok) throw new Error('rejected');
        location.reload();
      } catch (err) {
        verifyBtn.disabled = false;
        alert('Verification failed. Please try again.');
      }
    });
  </script>
</body>
</html>
"#;
