//! 动态优先级工作集
//!
//! 元素的排序依据（剩余包数、截止时间、发送端是否空闲……）在入集之后仍会变化，
//! 二叉堆在这种情况下会给出错误结果。这里保存无序元素，每次取最优都用当前的比较函数
//! 线性扫描一遍，`pop_by` 删除的正是上一次扫描选出的那个元素。

use std::cmp::Ordering;

/// 无序工作集，取最优时线性扫描
#[derive(Debug, Clone)]
pub struct WorkingSet<T> {
    items: Vec<T>,
    /// 上一次扫描选出的最优元素下标；集合变化后失效
    best: Option<usize>,
}

impl<T> Default for WorkingSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkingSet<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            best: None,
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.best = None;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
        self.best = None;
    }

    /// `cmp(a, b) == Greater` 表示 a 比 b 更应该先被选中；相等时取后加入的元素
    fn scan(&self, mut cmp: impl FnMut(&T, &T) -> Ordering) -> Option<usize> {
        let mut best = None;
        for (i, item) in self.items.iter().enumerate() {
            match best {
                Some(b) if cmp(item, &self.items[b]) == Ordering::Less => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// 用当前比较函数找出最优元素，并记住它的位置
    pub fn peek_by(&mut self, cmp: impl FnMut(&T, &T) -> Ordering) -> Option<&T> {
        self.best = self.scan(cmp);
        self.best.map(|i| &self.items[i])
    }

    /// 删除上一次 `peek_by` 选出的元素；若此后集合有变化则重新扫描
    pub fn pop_by(&mut self, cmp: impl FnMut(&T, &T) -> Ordering) -> Option<T> {
        let idx = match self.best.take() {
            Some(i) if i < self.items.len() => i,
            _ => self.scan(cmp)?,
        };
        Some(self.items.remove(idx))
    }

    /// 按当前排序依次取出全部元素（等价于反复 `pop_by`）
    pub fn drain_ranked_by(&mut self, mut cmp: impl FnMut(&T, &T) -> Ordering) -> Vec<T> {
        let mut ranked = Vec::with_capacity(self.items.len());
        while let Some(i) = self.scan(&mut cmp) {
            ranked.push(self.items.remove(i));
        }
        self.best = None;
        ranked
    }
}
