//! CSS样式管理模块

/// CSS样式管理器
pub struct CssStyleManager;

impl CssStyleManager {
    /// 评语报告样式（屏幕与打印共用）
    pub fn get_report_css() -> &'static str {
        r#"
        body {
            font-family: 'Helvetica Neue', Arial, 'Noto Sans CJK JP', sans-serif;
            margin: 0;
            padding: 20px;
            line-height: 1.6;
            color: #333;
            background-color: #fff;
        }
        .report-title {
            text-align: center;
            color: #2c3e50;
            border-bottom: 3px solid #3498db;
            padding-bottom: 10px;
            margin-bottom: 30px;
            font-size: 2.2em;
            font-weight: bold;
            page-break-after: avoid;
        }
        .section {
            margin: 30px 0;
            padding: 20px;
            border: 1px solid #e0e0e0;
            border-radius: 8px;
            background: #fafafa;
            break-inside: avoid;
        }
        .section h2 {
            color: #2c3e50;
            border-bottom: 2px solid #3498db;
            padding-bottom: 5px;
            margin-top: 0;
            font-size: 1.5em;
        }
        table {
            border-collapse: collapse;
            width: 100%;
            margin: 15px 0;
            background: white;
        }
        th, td {
            padding: 12px 15px;
            border: 1px solid #ddd;
            text-align: left;
            vertical-align: top;
        }
        th {
            background-color: #3498db;
            color: white;
            font-weight: bold;
        }
        .photo {
            text-align: center;
        }
        .photo img {
            max-width: 100%;
            max-height: 120mm;
            border-radius: 4px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.15);
        }
        .critique p {
            margin: 8px 0;
            text-align: justify;
        }
        .footer {
            margin-top: 40px;
            text-align: center;
            color: #7f8c8d;
            font-size: 0.9em;
        }
        @media print {
            body { padding: 0; }
            .section { box-shadow: none; }
        }
        "#
    }
}

pub fn get_report_css() -> &'static str {
    CssStyleManager::get_report_css()
}
